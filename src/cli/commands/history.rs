use crate::domain::SourceId;
use crate::state::AppContext;

pub async fn cmd_history(ctx: &AppContext, id: i32, limit: u64) -> anyhow::Result<()> {
    let source_id = SourceId::new(id);
    let scans = ctx.scan_service.scan_history(source_id, Some(limit)).await?;

    if scans.is_empty() {
        println!("No scans recorded for source {source_id}.");
        return Ok(());
    }

    println!("Recent Scans (last {}):", scans.len());
    println!("{:-<70}", "");

    for scan in scans {
        let state = ctx.scan_service.scan_state(&scan);
        println!("• Scan {} [{}] started {}", scan.id, state, scan.started_at.to_rfc3339());
        if let Some(ended) = scan.ended_at {
            println!(
                "  Ended {} | +{} -{}",
                ended.to_rfc3339(),
                scan.changes_added.unwrap_or(0),
                scan.changes_removed.unwrap_or(0)
            );
        }
        if let Some(error) = &scan.error {
            println!("  Error: {error}");
        }
    }

    Ok(())
}
