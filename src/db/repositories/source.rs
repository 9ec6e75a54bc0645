use crate::domain::SourceId;
use crate::entities::{media, prelude::*, scans, sources};
use crate::models::source::Source;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of an overlap-checked insert.
#[derive(Debug)]
pub enum SourceInsert {
    Inserted(Source),
    /// An existing source is an ancestor or descendant of the requested root.
    Overlaps(Source),
}

pub struct SourceRepository {
    conn: DatabaseConnection,
}

impl SourceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: sources::Model) -> Source {
        Source {
            id: SourceId::new(model.id),
            name: model.name,
            root_path: PathBuf::from(model.root_path),
            owner_id: model.owner_id,
            created_at: model.created_at,
        }
    }

    /// Inserts a source unless its root overlaps an existing one.
    ///
    /// The overlap check and the insert share one transaction.
    pub async fn add_exclusive(
        &self,
        name: &str,
        root_path: &Path,
        owner_id: i32,
    ) -> Result<SourceInsert> {
        let txn = self.conn.begin().await?;

        let existing = Sources::find().all(&txn).await?;
        if let Some(conflict) = existing
            .into_iter()
            .map(Self::map_model)
            .find(|s| s.overlaps(root_path))
        {
            txn.rollback().await?;
            return Ok(SourceInsert::Overlaps(conflict));
        }

        let root = root_path.to_string_lossy().to_string();
        let result = Sources::insert(sources::ActiveModel {
            name: Set(name.to_string()),
            root_path: Set(root),
            owner_id: Set(owner_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })
        .exec(&txn)
        .await?;

        let model = Sources::find_by_id(result.last_insert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created source"))?;

        txn.commit().await?;

        info!(source_id = model.id, name = %model.name, root = %model.root_path, "Added source");
        Ok(SourceInsert::Inserted(Self::map_model(model)))
    }

    pub async fn get(&self, id: SourceId) -> Result<Option<Source>> {
        let model = Sources::find_by_id(id.value()).one(&self.conn).await?;
        Ok(model.map(Self::map_model))
    }

    pub async fn list_all(&self) -> Result<Vec<Source>> {
        let rows = Sources::find()
            .order_by_asc(sources::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Deletes a source together with its media and scan rows.
    pub async fn remove(&self, id: SourceId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        media::Entity::delete_many()
            .filter(media::Column::SourceId.eq(id.value()))
            .exec(&txn)
            .await?;

        scans::Entity::delete_many()
            .filter(scans::Column::SourceId.eq(id.value()))
            .exec(&txn)
            .await?;

        let result = Sources::delete_by_id(id.value()).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!(source_id = %id, "Removed source");
        }
        Ok(removed)
    }
}
