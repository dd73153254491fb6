use crate::filter::FilterCounts;

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    /// (keyword, articles returned), in query order.
    pub keywords: Vec<(String, u32)>,
    pub keywords_failed: Vec<String>,
    pub articles_fetched: u32,
    pub untitled: u32,
    pub unclassified: u32,
    pub extraction_failed: u32,
    pub filtered: FilterCounts,
    pub no_location: u32,
    pub excluded_location: u32,
    pub geocode_calls: u32,
    pub geocode_cache_hits: u32,
    pub geocode_failed: u32,
    pub duplicates_collapsed: u32,
    pub events_stored: u32,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== GeoNews Run Complete ===")?;
        writeln!(f, "Articles fetched:   {}", self.articles_fetched)?;
        writeln!(f, "Untitled:           {}", self.untitled)?;
        writeln!(f, "Unclassified:       {}", self.unclassified)?;
        writeln!(f, "Extraction failed:  {}", self.extraction_failed)?;
        writeln!(f, "\nFiltered:")?;
        writeln!(f, "  Duplicate URL:    {}", self.filtered.duplicate_url)?;
        writeln!(f, "  Duplicate title:  {}", self.filtered.duplicate_title)?;
        writeln!(f, "  Denied URL:       {}", self.filtered.denied_url)?;
        writeln!(f, "  Noisy title:      {}", self.filtered.noisy_title)?;
        writeln!(f, "\nLocations:")?;
        writeln!(f, "  No candidate:     {}", self.no_location)?;
        writeln!(f, "  Excluded:         {}", self.excluded_location)?;
        writeln!(f, "  Geocoder calls:   {}", self.geocode_calls)?;
        writeln!(f, "  Cache hits:       {}", self.geocode_cache_hits)?;
        writeln!(f, "  Geocode failed:   {}", self.geocode_failed)?;
        writeln!(f, "\nDuplicates collapsed: {}", self.duplicates_collapsed)?;
        writeln!(f, "Events stored:        {}", self.events_stored)?;
        writeln!(f, "\nBy keyword:")?;
        for (keyword, count) in &self.keywords {
            writeln!(f, "  {keyword:<12} {count}")?;
        }
        if !self.keywords_failed.is_empty() {
            writeln!(f, "Failed keywords: {}", self.keywords_failed.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_keywords_and_failures() {
        let stats = PipelineStats {
            keywords: vec![("earthquake".into(), 12), ("flood".into(), 0)],
            keywords_failed: vec!["flood".into()],
            events_stored: 7,
            ..Default::default()
        };
        let summary = stats.to_string();
        assert!(summary.contains("earthquake   12"));
        assert!(summary.contains("Failed keywords: flood"));
        assert!(summary.contains("Events stored:        7"));
    }
}
