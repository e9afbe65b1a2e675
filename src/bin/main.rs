use std::{
    error::Error,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use tracing::info;
use tracing_subscriber::EnvFilter;

use cdsyncmon::{
    activity::{ActivityEvent, ActivityFeed},
    cli::{Cli, Commands, ConfigAction, parse_args, parse_interval},
    config::MonitorConfig,
    coordinator::{ActionCoordinator, DisableOutcome, PendingAction, StopChoice},
    error::MonitorError,
    logtail,
    notify::Notifier,
    poller::{StatusPoller, SyncSnapshot},
    systemd::{SystemdClient, UnitNames},
    trigger::SyncTrigger,
};

const GREEN_BOLD: &str = "\x1b[1;32m"; // Bright Green
const RED_BOLD: &str = "\x1b[1;31m"; // Bright Red
const YELLOW_BOLD: &str = "\x1b[1;33m"; // Yellow/Gold
const RESET: &str = "\x1b[0m"; // Reset color

fn main() -> Result<(), Box<dyn Error>> {
    let args = parse_args();
    init_logging(&args);

    let config = MonitorConfig::load(Path::new(&args.config))?;
    let notifier = Notifier::new(config.notify_level);

    match args.command {
        Commands::Status {
            json,
            no_color,
            stream,
        } => {
            let mut poller = build_poller(&config);
            match stream.as_deref() {
                Some(raw) => {
                    let interval = parse_interval(raw)
                        .ok_or_else(|| format!("invalid stream interval '{raw}'"))?;
                    stream_status(&mut poller, interval, json, no_color)?;
                }
                None => {
                    let snapshot = poller.poll();
                    print_snapshot(&snapshot, json, no_color)?;
                }
            }
        }
        Commands::Enable => {
            let mut poller = build_poller(&config);
            let sync_running = poller.sync_running();
            if poller.coordinator_mut().request_enable(sync_running) {
                notifier.action("Sync enabled", "Watcher service and poll timer started");
                println!("Sync enabled");
            } else {
                notifier.action(
                    "Cannot enable",
                    "A synchronization is currently in progress.\nPlease wait until it finishes.",
                );
                return Err(MonitorError::SyncInProgress.into());
            }
        }
        Commands::Disable { when_idle, force } => {
            run_disable(&config, &notifier, when_idle, force)?;
        }
        Commands::Sync { resync, dedupe } => {
            let trigger = SyncTrigger::from_config(&config);
            match trigger.run(resync, dedupe.as_deref()) {
                Ok(()) => {
                    notifier.action("Manual Sync", "Synchronization started...");
                    println!("Sync started");
                }
                Err(err @ MonitorError::SyncInProgress) => {
                    notifier.action("Ignored", "Sync is already running.");
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Logs { raw } => {
            if raw {
                print!("{}", logtail::full_view(&config.log_file));
            } else {
                let mut feed = ActivityFeed::new();
                let (events, _) = feed.refresh(&config.log_file);
                if events.is_empty() {
                    println!("No recent sync activity.");
                }
                for event in events {
                    println!("{}", render_event(event));
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => {
                match MonitorConfig::get_raw(&config.config_path, &key)? {
                    Some(value) => println!("{value}"),
                    None => {
                        return Err(format!(
                            "key '{key}' is not set in {}",
                            config.config_path.display()
                        )
                        .into());
                    }
                }
            }
            ConfigAction::Set { key, value } => {
                MonitorConfig::set_key(&config.config_path, &key, &value)?;
                info!("Set {key} in {}", config.config_path.display());
            }
        },
    }

    Ok(())
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn build_poller(config: &MonitorConfig) -> StatusPoller<SystemdClient> {
    let units = UnitNames::for_dir(&config.base_dir);
    let coordinator =
        ActionCoordinator::new(SystemdClient::new(), units, config.lock_file.clone());
    StatusPoller::new(coordinator, config)
}

fn run_disable(
    config: &MonitorConfig,
    notifier: &Notifier,
    when_idle: bool,
    force: bool,
) -> Result<(), Box<dyn Error>> {
    let mut poller = build_poller(config);
    let sync_running = poller.sync_running();

    if force && sync_running {
        poller.coordinator_mut().force_stop();
        notifier.action("Sync disabled", "The running synchronization was stopped.");
        println!("Sync force-stopped and disabled");
        return Ok(());
    }

    match poller.coordinator_mut().request_disable(sync_running) {
        DisableOutcome::Stopped => {
            notifier.action("Sync disabled", "Watcher service and poll timer stopped");
            println!("Sync disabled");
            Ok(())
        }
        DisableOutcome::PendingCleared => {
            println!("Pending graceful stop cancelled");
            Ok(())
        }
        DisableOutcome::ChoiceRequired => {
            if !when_idle {
                notifier.action(
                    "Cannot Disable",
                    "A synchronization is currently in progress.\nPlease wait until it finishes.",
                );
                return Err(MonitorError::SyncInProgress.into());
            }

            poller.coordinator_mut().resolve_stop_choice(StopChoice::Graceful);
            println!("Sync in progress; will disable when it finishes (Ctrl-C cancels)");
            wait_for_deferred_disable(&mut poller, config.poll_interval)?;
            Ok(())
        }
    }
}

/// Drives the poll loop until the queued disable fires or the user cancels.
fn wait_for_deferred_disable(
    poller: &mut StatusPoller<SystemdClient>,
    interval: Duration,
) -> Result<(), Box<dyn Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .map_err(MonitorError::SignalHandlerError)?;

    loop {
        if !running.load(Ordering::SeqCst) {
            poller.coordinator_mut().cancel_pending();
            println!("Cancelled; sync stays enabled");
            return Ok(());
        }

        let snapshot = poller.poll();
        if snapshot.pending_action == PendingAction::None {
            println!("Sync finished; service stopped and disabled");
            return Ok(());
        }

        interruptible_sleep(interval, &running);
    }
}

fn stream_status(
    poller: &mut StatusPoller<SystemdClient>,
    interval: Duration,
    json: bool,
    no_color: bool,
) -> Result<(), Box<dyn Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .map_err(MonitorError::SignalHandlerError)?;

    let mut last: Option<SyncSnapshot> = None;
    while running.load(Ordering::SeqCst) {
        let snapshot = poller.poll();

        // Reprint only when something visible moved, so an open terminal
        // isn't churned by identical frames.
        let unchanged = last
            .as_ref()
            .is_some_and(|prev| prev.same_display(&snapshot));
        if !unchanged {
            print_snapshot(&snapshot, json, no_color)?;
        }
        last = Some(snapshot);

        interruptible_sleep(interval, &running);
    }

    Ok(())
}

fn interruptible_sleep(interval: Duration, running: &AtomicBool) {
    let mut slept = Duration::ZERO;
    while slept < interval && running.load(Ordering::SeqCst) {
        let remaining = interval.saturating_sub(slept);
        let step = remaining.min(Duration::from_millis(100));
        thread::sleep(step);
        slept += step;
    }
}

fn print_snapshot(
    snapshot: &SyncSnapshot,
    json: bool,
    no_color: bool,
) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    let (green, red, yellow, reset) = if no_color {
        ("", "", "", "")
    } else {
        (GREEN_BOLD, RED_BOLD, YELLOW_BOLD, RESET)
    };

    if snapshot.service_active {
        println!("● CDSync: {green}ACTIVE{reset}");
    } else {
        println!("● CDSync: {red}STOPPED{reset}");
    }

    if snapshot.sync_running {
        println!("  {yellow}Sync in progress...{reset}");
    }

    if snapshot.pending_action == PendingAction::DisableWhenIdle {
        println!("  Pending: disable when current sync finishes");
    }

    if !snapshot.activity.is_empty() {
        println!("  Recent activity:");
        for event in &snapshot.activity {
            println!("    {}", render_event(event));
        }
    }

    Ok(())
}

fn render_event(event: &ActivityEvent) -> String {
    match &event.timestamp {
        Some(ts) => format!("{ts} {} {}", event.icon.glyph(), event.subject),
        None => format!("{} {}", event.icon.glyph(), event.subject),
    }
}
