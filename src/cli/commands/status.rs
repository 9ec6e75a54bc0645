use crate::domain::SourceId;
use crate::state::AppContext;

pub async fn cmd_status(ctx: &AppContext, id: Option<i32>) -> anyhow::Result<()> {
    let filter = id.map(SourceId::new);

    match ctx.scan_service.scan_underway(filter).await? {
        Some(source_id) => println!("Scan underway for source {source_id}"),
        None => println!("No scan underway"),
    }

    Ok(())
}
