use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use podium_node::{
    Config, EventSink, LogSink, Scheduler, SystemClock, TournamentService, ValidatedConfig,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

fn print_dry_run_report(config: &ValidatedConfig) {
    println!("dry-run report");
    println!("  log_level: {}", config.log_level);
    println!("  json_logs: {}", config.json_logs);
    println!(
        "  sweep_interval: {}ms",
        config.sweep_interval.as_millis()
    );
    println!(
        "  min_tournament_duration: {}ms",
        config.store.min_duration_ms
    );
    println!(
        "  pool_contribution: {} bps",
        config.store.pool_contribution_bps
    );
    println!(
        "  winner_share: {} bps (minimum prize {}, {} positions)",
        config.prize.winner_share_bps, config.prize.minimum_prize, config.prize.payout_positions
    );
    println!(
        "  delivery: {} attempts, {}ms backoff",
        config.delivery.attempts,
        config.delivery.backoff.as_millis()
    );
    println!("  recurring templates: {}", config.recurring.len());
    for template in &config.recurring {
        println!(
            "    {} {} (fee {}, cap {})",
            template.kind, template.game_id, template.entry_fee, template.max_participants
        );
    }
}

fn init_tracing(config: &ValidatedConfig) {
    let builder = tracing_subscriber::fmt().with_max_level(config.log_level);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    // Parse arguments
    let matches = Command::new("podium-node")
        .about("Tournament lifecycle and prize distribution service.")
        .arg(
            Arg::new("config")
                .long("config")
                .help("YAML config file; built-in defaults are used when omitted")
                .required(false),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate config and exit without starting the service")
                .action(ArgAction::SetTrue),
        )
        .get_matches();
    let dry_run = matches.get_flag("dry-run");

    // Load config
    let config: Config = match matches.get_one::<String>("config") {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config file {path}"))?;
            serde_yaml::from_str(&contents).context("Could not parse config file")?
        }
        None => Config::default(),
    };

    if dry_run {
        println!("{config:#?}");
        let config = config.validate().context("Invalid config")?;
        print_dry_run_report(&config);
        println!("config ok");
        return Ok(());
    }

    let config = config.validate().context("Invalid config")?;
    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: ValidatedConfig) -> Result<()> {
    let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(LogSink)];
    let (service, dispatcher) = TournamentService::new(&config, Arc::new(SystemClock), sinks);
    info!(
        recurring = config.recurring.len(),
        sweep_interval_ms = config.sweep_interval.as_millis() as u64,
        "tournament service started"
    );

    // Create the current periods' tournaments before the first recurring tick.
    let created = service.ensure_recurring();
    info!(count = created.len(), "recurring tournaments ensured");

    let (shutdown, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::spawn(service.clone(), &config, shutdown_rx)?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("shutdown requested");
    let _ = shutdown.send(true);

    if let Err(err) = scheduler.await {
        error!(?err, "scheduler task failed");
    }
    drop(service);
    if let Err(err) = dispatcher.await {
        error!(?err, "event dispatcher task failed");
    }
    info!("tournament service stopped");
    Ok(())
}
