use std::sync::Arc;
use std::time::Duration;

use bookshelf_core::sync::PullOutcome;
use bookshelf_core::{SyncEngine, SyncReport, SyncScheduler};
use tokio::sync::broadcast::error::RecvError;

use crate::commands::common::{print_notices, App};
use crate::error::CliError;

pub async fn run_sync(watch: bool, app: &App) -> Result<(), CliError> {
    let engine = app.engine();
    if watch {
        return run_sync_watch(engine, app.config.sync_interval).await;
    }

    let mut notices = engine.notices();
    let report = engine.sync().await;
    print_notices(&mut notices);

    for line in format_sync_report(&report?) {
        println!("{line}");
    }
    Ok(())
}

async fn run_sync_watch(engine: SyncEngine, interval: Duration) -> Result<(), CliError> {
    let engine = Arc::new(engine);
    let mut notices = engine.notices();
    let scheduler = SyncScheduler::spawn(engine, interval);
    println!(
        "Syncing every {}s, press Ctrl-C to stop",
        interval.as_secs()
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            notice = notices.recv() => match notice {
                Ok(notice) => eprintln!("{notice}"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} sync notices", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.shutdown().await;
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    if report.skipped {
        return vec!["Another sync is already running".to_string()];
    }

    let mut lines = vec![format!(
        "Pushed {}, deleted {}, dropped {} never-synced",
        report.pushed, report.deleted, report.purged_local
    )];
    if report.push_failures > 0 {
        lines.push(format!(
            "{} push call(s) failed; changes stay pending",
            report.push_failures
        ));
    }
    match &report.pull {
        PullOutcome::Replaced { rows } => lines.push(format!("Pulled {rows} items")),
        PullOutcome::Failed { message } => lines.push(format!("Pull failed: {message}")),
        PullOutcome::NotAttempted => {}
    }
    lines.push(format!("State: {}", report.state));
    lines
}
