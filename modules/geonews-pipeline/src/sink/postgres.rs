//! Postgres-backed event collection.
//!
//! `replace_all` is a staged write plus atomic swap: rows are first inserted
//! into `disaster_events_staging` under a fresh run id, then one short
//! transaction replaces the live table from staging. Readers see either the
//! previous collection or the new one, never an empty or partial table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use geonews_common::{DisasterCategory, GeoNewsError, ResolvedEvent};

use crate::traits::EventSink;

/// Eleven bound parameters per row; stays well under Postgres' 65535 limit.
const STAGE_BATCH_ROWS: usize = 1000;

/// Transaction-scoped advisory lock serialising swaps across processes.
pub const SWAP_LOCK_KEY: i64 = 0x0067_656f_6e65_7773;

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    title: String,
    disaster_event: String,
    published_at: DateTime<Utc>,
    source: Option<String>,
    url: String,
    location: String,
    latitude: f64,
    longitude: f64,
}

impl TryFrom<EventRow> for ResolvedEvent {
    type Error = anyhow::Error;

    fn try_from(row: EventRow) -> Result<Self> {
        let disaster_event: DisasterCategory = row
            .disaster_event
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        Ok(ResolvedEvent {
            title: row.title,
            disaster_event,
            timestamp: row.published_at,
            source: row.source,
            url: row.url,
            location: row.location,
            latitude: row.latitude,
            longitude: row.longitude,
        })
    }
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .context("Failed to connect to Postgres")?;
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    /// The live collection in insertion order.
    pub async fn load_all(&self) -> Result<Vec<ResolvedEvent>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT title, disaster_event, published_at, source, url, location, latitude, longitude
            FROM disaster_events
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResolvedEvent::try_from).collect()
    }

    async fn stage(&self, run_id: Uuid, events: &[ResolvedEvent]) -> Result<()> {
        for (batch, chunk) in events.chunks(STAGE_BATCH_ROWS).enumerate() {
            let offset = batch * STAGE_BATCH_ROWS;
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO disaster_events_staging \
                 (run_id, position, title, disaster_event, published_at, event_date, \
                  source, url, location, latitude, longitude) ",
            );
            qb.push_values(chunk.iter().enumerate(), |mut row, (i, e)| {
                let event_date: NaiveDate = e.timestamp.date_naive();
                row.push_bind(run_id)
                    .push_bind((offset + i) as i32)
                    .push_bind(&e.title)
                    .push_bind(e.disaster_event.as_str())
                    .push_bind(e.timestamp)
                    .push_bind(event_date)
                    .push_bind(&e.source)
                    .push_bind(&e.url)
                    .push_bind(&e.location)
                    .push_bind(e.latitude)
                    .push_bind(e.longitude);
            });
            qb.build().execute(&self.pool).await?;
        }
        debug!(%run_id, rows = events.len(), "Staged events");
        Ok(())
    }

    async fn discard_staged(&self, run_id: Uuid) {
        if let Err(e) = sqlx::query("DELETE FROM disaster_events_staging WHERE run_id = $1")
            .bind(run_id)
            .execute(&self.pool)
            .await
        {
            warn!(%run_id, error = %e, "Failed to discard staged events");
        }
    }

    /// Swap the staged rows for `run_id` into the live table in one transaction.
    async fn swap(&self, run_id: Uuid) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(SWAP_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await?;
        if !locked {
            tx.rollback().await?;
            return Err(GeoNewsError::RunLockConflict.into());
        }

        sqlx::query("DELETE FROM disaster_events")
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO disaster_events
                (title, disaster_event, published_at, event_date, source, url, location, latitude, longitude)
            SELECT title, disaster_event, published_at, event_date, source, url, location, latitude, longitude
            FROM disaster_events_staging
            WHERE run_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(run_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Also sweep rows left behind by runs that crashed before their swap.
        sqlx::query(
            "DELETE FROM disaster_events_staging \
             WHERE run_id = $1 OR staged_at < now() - interval '1 day'",
        )
        .bind(run_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }
}

#[async_trait]
impl EventSink for PgEventStore {
    async fn replace_all(&self, events: &[ResolvedEvent]) -> Result<u64> {
        let run_id = Uuid::new_v4();

        if let Err(e) = self.stage(run_id, events).await {
            self.discard_staged(run_id).await;
            return Err(e.context("Failed to stage events"));
        }

        match self.swap(run_id).await {
            Ok(inserted) => {
                info!(%run_id, rows = inserted, "Swapped disaster_events");
                Ok(inserted)
            }
            Err(e) => {
                self.discard_staged(run_id).await;
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
