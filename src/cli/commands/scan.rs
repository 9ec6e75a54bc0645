use std::sync::Arc;

use crate::domain::SourceId;
use crate::domain::events::NotificationEvent;
use crate::models::scan::Scan;
use crate::state::AppContext;

fn print_scan(scan: &Scan) {
    println!("  Scan ID: {}", scan.id);
    println!("  Added:   {}", scan.changes_added.unwrap_or(0));
    println!("  Removed: {}", scan.changes_removed.unwrap_or(0));
    if let Some(duration) = scan.duration() {
        println!("  Took:    {} ms", duration.num_milliseconds());
    }
}

pub async fn cmd_scan(ctx: &AppContext, id: i32, background: bool) -> anyhow::Result<()> {
    let source_id = SourceId::new(id);

    if !background {
        let scan = ctx.scan_service.scan_source(source_id).await?;
        println!("Scan complete!");
        print_scan(&scan);
        return Ok(());
    }

    // Subscribe first so the completion event cannot be missed.
    let mut events = ctx.event_bus.subscribe();
    let started = Arc::clone(&ctx.scan_service).spawn_scan(source_id).await?;
    println!("Scan {} started for source {}", started.id, source_id);

    loop {
        match events.recv().await {
            Ok(NotificationEvent::ScanFinished { scan_id, .. }) if scan_id == started.id => {
                if let Some(scan) = ctx.scan_service.get_scan(scan_id).await? {
                    println!("Scan complete!");
                    print_scan(&scan);
                }
                return Ok(());
            }
            Ok(NotificationEvent::ScanFailed {
                scan_id, message, ..
            }) if scan_id == started.id => {
                anyhow::bail!("Scan {scan_id} failed: {message}");
            }
            Ok(_) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

pub async fn cmd_scan_all(ctx: &AppContext) -> anyhow::Result<()> {
    let entries = ctx.scan_service.scan_all().await?;

    if entries.is_empty() {
        println!("No sources registered.");
        return Ok(());
    }

    println!("{:-<70}", "");
    for entry in entries {
        match (entry.scan, entry.error) {
            (Some(scan), _) => {
                println!("✓ Source {}", entry.source_id);
                print_scan(&scan);
            }
            (None, error) => {
                println!(
                    "✗ Source {}: {}",
                    entry.source_id,
                    error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
    }

    Ok(())
}
