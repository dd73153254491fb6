use serde::Deserialize;

/// One row of a `/search?format=json` response. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
}

/// A parsed best match.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

impl TryFrom<SearchResult> for Place {
    type Error = crate::NominatimError;

    fn try_from(r: SearchResult) -> Result<Self, Self::Error> {
        let lat: f64 = r
            .lat
            .parse()
            .map_err(|_| crate::NominatimError::Parse(format!("bad latitude {:?}", r.lat)))?;
        let lon: f64 = r
            .lon
            .parse()
            .map_err(|_| crate::NominatimError::Parse(format!("bad longitude {:?}", r.lon)))?;
        Ok(Place {
            lat,
            lon,
            display_name: r.display_name,
        })
    }
}
