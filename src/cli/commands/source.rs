//! Source management command handlers

use std::path::Path;

use crate::domain::SourceId;
use crate::state::AppContext;

pub async fn cmd_source_add(
    ctx: &AppContext,
    name: &str,
    path: &Path,
    owner_id: i32,
) -> anyhow::Result<()> {
    let source = ctx.source_service.add_source(name, path, owner_id).await?;

    println!("✓ Added source: {} (ID: {})", source.name, source.id);
    println!("  Root: {}", source.root_path.display());
    println!();
    println!("Run 'shelfsync scan {}' to index it.", source.id);
    Ok(())
}

pub async fn cmd_source_list(ctx: &AppContext) -> anyhow::Result<()> {
    let sources = ctx.source_service.list_sources().await?;

    if sources.is_empty() {
        println!("No sources registered.");
        println!();
        println!("Add one with: shelfsync source add <name> <path>");
        return Ok(());
    }

    println!("Sources ({} total)", sources.len());
    println!("{:-<70}", "");

    for source in sources {
        let media = ctx.store.count_media_for_source(source.id).await?;
        println!("• {} [{} files]", source.name, media);
        println!(
            "  ID: {} | Root: {} | Owner: {}",
            source.id,
            source.root_path.display(),
            source.owner_id
        );
    }

    Ok(())
}

pub async fn cmd_source_remove(ctx: &AppContext, id: i32) -> anyhow::Result<()> {
    let id = SourceId::new(id);
    let source = ctx.source_service.get_source(id).await?;
    ctx.source_service.remove_source(id).await?;

    println!("✓ Removed source: {} (ID: {})", source.name, source.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Store;
    use crate::domain::ProcessClock;
    use crate::library::LocalFileSystem;
    use sea_orm::ConnectionTrait;
    use std::sync::Arc;

    #[tokio::test]
    async fn list_reports_count_failures() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        let store = Store::new(&url).await.unwrap();
        let ctx = AppContext::with_parts(
            Config::default(),
            store,
            Arc::new(LocalFileSystem::default()),
            ProcessClock::new(),
        );
        let root = dir.path().join("music");
        std::fs::create_dir(&root).unwrap();
        cmd_source_add(&ctx, "music", &root, 1).await.unwrap();
        cmd_source_list(&ctx).await.unwrap();

        ctx.store
            .conn
            .execute_unprepared("DROP TABLE media")
            .await
            .unwrap();

        assert!(cmd_source_list(&ctx).await.is_err());
    }
}
