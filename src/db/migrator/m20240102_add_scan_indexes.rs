use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Running-scan lookups filter on (source_id, ended_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_scans_source_ended")
                    .table(Scans::Table)
                    .col(Scans::SourceId)
                    .col(Scans::EndedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_source_id")
                    .table(Media::Table)
                    .col(Media::SourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_media_source_id")
                    .table(Media::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scans_source_ended")
                    .table(Scans::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Scans {
    Table,
    SourceId,
    EndedAt,
}

#[derive(DeriveIden)]
enum Media {
    Table,
    SourceId,
}
