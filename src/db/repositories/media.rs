use crate::domain::{MediaId, SourceId};
use crate::entities::{media, prelude::*};
use crate::models::media::{MediaRecord, NewMedia};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

pub struct MediaRepository {
    conn: DatabaseConnection,
}

impl MediaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: media::Model) -> MediaRecord {
        MediaRecord {
            id: MediaId::new(model.id),
            source_id: SourceId::new(model.source_id),
            path: model.path,
            mime_type: model.mime_type,
            added_at: model.added_at,
        }
    }

    pub async fn list_for_source(&self, source_id: SourceId) -> Result<Vec<MediaRecord>> {
        let rows = Media::find()
            .filter(media::Column::SourceId.eq(source_id.value()))
            .order_by_asc(media::Column::Path)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get_by_path(&self, path: &str) -> Result<Option<MediaRecord>> {
        let model = Media::find()
            .filter(media::Column::Path.eq(path))
            .one(&self.conn)
            .await?;
        Ok(model.map(Self::map_model))
    }

    pub async fn count_for_source(&self, source_id: SourceId) -> Result<u64> {
        let count = Media::find()
            .filter(media::Column::SourceId.eq(source_id.value()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    /// Inserts the record unless a row with the same path already exists.
    ///
    /// Returns `true` when a row was written.
    pub async fn insert_if_absent(&self, new: NewMedia) -> Result<bool> {
        let active_model = media::ActiveModel {
            source_id: Set(new.source_id.value()),
            path: Set(new.path),
            mime_type: Set(new.mime_type),
            added_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let rows = Media::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(media::Column::Path)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(rows > 0)
    }

    /// Returns `true` when a row was deleted.
    pub async fn delete_by_path(&self, path: &str) -> Result<bool> {
        let result = Media::delete_many()
            .filter(media::Column::Path.eq(path))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_by_ids(&self, ids: &[MediaId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let raw: Vec<i32> = ids.iter().map(MediaId::value).collect();
        let result = Media::delete_many()
            .filter(media::Column::Id.is_in(raw))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
