// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod hub;
pub mod logging;
pub mod refresh;
pub mod service;
pub mod session;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::refresh::{LogOnlyRefresher, Refresher};
use crate::service::NotificationService;
use crate::session::{LineTransport, SessionOutcome};
use crate::types::{EventFilter, InstanceId};

pub use crate::hub::{HubHandle, HubOptions, HubStatus, NotificationHub, SubscriptionHandle};
pub use crate::types::{DomainEvent, EventKind, Notification};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus the `--user-dir` override)
/// - the notification service and its hub
/// - one stdout session with the CLI filter
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let filter = EventFilter::parse(&args.filters)?;

    if args.dry_run {
        print_dry_run(&config, &filter);
        return Ok(());
    }

    // The standalone binary has no package index; it only logs rescans.
    let refresher: Arc<dyn Refresher> = Arc::new(LogOnlyRefresher::new([InstanceId(1)]));
    let mut service = NotificationService::start(&config, refresher);

    // Ctrl-C → end the session, then shut the hub down.
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl+C received");
    };

    let transport = LineTransport::new(tokio::io::stdout());
    let outcome = service
        .get_notifications_until(filter, transport, interrupted)
        .await;
    service.shutdown().await;

    match outcome? {
        SessionOutcome::TransportFailed(reason) => Err(anyhow!("stdout closed: {reason}")),
        outcome => {
            debug!(?outcome, "notification stream ended");
            Ok(())
        }
    }
}

/// Load the config named on the command line (or the default path) and
/// apply `--user-dir`.
pub fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = load_or_default(&path)?;
    if let Some(user_dir) = &args.user_dir {
        config = config.with_user_dir(user_dir);
    }
    Ok(config)
}

/// Simple dry-run output: print the resolved settings.
fn print_dry_run(config: &ConfigFile, filter: &EventFilter) {
    let n = config.notifications();

    println!("corewatch dry-run");
    match config.hardware_dir() {
        Some(dir) => println!("  watch: {}", dir.display()),
        None => println!("  watch: <directories.user not set>"),
    }
    println!("  notifications.queue_capacity = {}", n.queue_capacity);
    println!("  notifications.watch_buffer = {}", n.watch_buffer);
    println!("  notifications.control_buffer = {}", n.control_buffer);
    if !n.ignore.is_empty() {
        println!("  notifications.ignore = {:?}", n.ignore);
    }
    if filter.is_accept_all() {
        println!("  filter: all kinds");
    } else {
        let kinds: Vec<String> = filter.kinds().map(|k| k.to_string()).collect();
        println!("  filter: {}", kinds.join(", "));
    }

    debug!("dry-run complete (nothing watched)");
}
