use crate::domain::{ScanId, SingleFlightPolicy, SourceId};
use crate::entities::{prelude::*, scans};
use crate::models::scan::{ChangeCounts, Scan};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::debug;

/// Outcome of the single-flight check-and-insert.
#[derive(Debug)]
pub enum ScanBegin {
    Started(Scan),
    /// A scan started by this process is still running.
    Blocked(Scan),
}

/// Fields written once when a scan ends.
#[derive(Debug, Clone)]
pub struct ScanCompletion {
    pub ended_at: DateTime<Utc>,
    pub counts: ChangeCounts,
    pub error: Option<String>,
}

pub struct ScanRepository {
    conn: DatabaseConnection,
}

// Rows with an unparsable timestamp read as the epoch, which makes an open
// row look abandoned rather than blocking its source forever.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

impl ScanRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: scans::Model) -> Scan {
        Scan {
            id: ScanId::new(model.id),
            source_id: SourceId::new(model.source_id),
            started_at: parse_timestamp(&model.started_at),
            ended_at: model.ended_at.as_deref().map(parse_timestamp),
            changes_added: model.changes_added,
            changes_removed: model.changes_removed,
            error: model.error,
        }
    }

    /// Checks for a running scan and inserts a new one in a single transaction.
    ///
    /// Open rows started before `process_started_at` belong to a dead process
    /// and do not block; they are left untouched as history.
    pub async fn begin_exclusive(
        &self,
        source_id: SourceId,
        policy: SingleFlightPolicy,
        process_started_at: DateTime<Utc>,
    ) -> Result<ScanBegin> {
        let txn = self.conn.begin().await?;

        let mut query = Scans::find().filter(scans::Column::EndedAt.is_null());
        if !policy.is_global() {
            query = query.filter(scans::Column::SourceId.eq(source_id.value()));
        }
        let open = query
            .order_by_desc(scans::Column::Id)
            .all(&txn)
            .await?;

        for row in open {
            let scan = Self::map_model(row);
            if scan.is_running(process_started_at) {
                txn.rollback().await?;
                return Ok(ScanBegin::Blocked(scan));
            }
            debug!(
                scan_id = %scan.id,
                source_id = %scan.source_id,
                started_at = %scan.started_at,
                "Ignoring scan abandoned by a previous process"
            );
        }

        let result = Scans::insert(scans::ActiveModel {
            source_id: Set(source_id.value()),
            started_at: Set(Utc::now().to_rfc3339()),
            ended_at: Set(None),
            changes_added: Set(None),
            changes_removed: Set(None),
            error: Set(None),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let model = Scans::find_by_id(result.last_insert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created scan"))?;

        txn.commit().await?;
        Ok(ScanBegin::Started(Self::map_model(model)))
    }

    /// Writes the end of a scan. Only an open row is updated, so a scan can
    /// be finalized at most once; returns `false` if it was already closed.
    pub async fn finalize(&self, id: ScanId, completion: ScanCompletion) -> Result<bool> {
        let result = Scans::update_many()
            .col_expr(
                scans::Column::EndedAt,
                sea_orm::sea_query::Expr::value(completion.ended_at.to_rfc3339()),
            )
            .col_expr(
                scans::Column::ChangesAdded,
                sea_orm::sea_query::Expr::value(completion.counts.added),
            )
            .col_expr(
                scans::Column::ChangesRemoved,
                sea_orm::sea_query::Expr::value(completion.counts.removed),
            )
            .col_expr(
                scans::Column::Error,
                sea_orm::sea_query::Expr::value(completion.error),
            )
            .filter(scans::Column::Id.eq(id.value()))
            .filter(scans::Column::EndedAt.is_null())
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn get(&self, id: ScanId) -> Result<Option<Scan>> {
        let model = Scans::find_by_id(id.value()).one(&self.conn).await?;
        Ok(model.map(Self::map_model))
    }

    /// Scans of one source, newest first.
    pub async fn history(&self, source_id: SourceId, limit: Option<u64>) -> Result<Vec<Scan>> {
        let rows = Scans::find()
            .filter(scans::Column::SourceId.eq(source_id.value()))
            .order_by_desc(scans::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Rows with no end time, optionally restricted to one source, newest first.
    pub async fn list_open(&self, source_id: Option<SourceId>) -> Result<Vec<Scan>> {
        let mut query = Scans::find().filter(scans::Column::EndedAt.is_null());
        if let Some(id) = source_id {
            query = query.filter(scans::Column::SourceId.eq(id.value()));
        }
        let rows = query
            .order_by_desc(scans::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_timestamps() {
        let parsed = parse_timestamp("2024-01-01T00:00:00+00:00");
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn garbage_timestamp_reads_as_epoch() {
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
    }
}
