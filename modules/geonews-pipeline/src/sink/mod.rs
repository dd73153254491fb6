pub mod json_file;
pub mod postgres;

pub use json_file::JsonFileSink;
pub use postgres::PgEventStore;

use std::sync::Arc;

use anyhow::Result;

use geonews_common::SinkTarget;

use crate::traits::EventSink;

/// Build the sink selected by config. Postgres is migrated before use.
pub async fn open(target: &SinkTarget) -> Result<Arc<dyn EventSink>> {
    match target {
        SinkTarget::Postgres { database_url } => {
            let store = PgEventStore::connect(database_url).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        SinkTarget::JsonFile { path } => Ok(Arc::new(JsonFileSink::new(path.clone()))),
    }
}
