//! rolebootd — the roleboot daemon.
//!
//! # Usage
//!
//! ```text
//! rolebootd --config /etc/roleboot/config.toml run
//! rolebootd attempt
//! rolebootd status
//! rolebootd store set cluster leader-address 10.0.0.1
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use roleboot_core::{
    BootstrapOutcome, CLUSTER_NAMESPACE, FileSentinel, IP_NAMESPACE, LEADER_ADDRESS_KEY,
    ROLE_NAMESPACE, SentinelGate,
};
use rolebootd::{BootstrapScheduler, RolebootConfig, SchedulerExit, build_bootstrap, open_store};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rolebootd", about = "roleboot node bootstrap daemon")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "/etc/roleboot/config.toml")]
    config: PathBuf,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attempt bootstrap every interval until the node is sealed.
    Run {
        /// Override the attempt interval in seconds.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Run a single bootstrap attempt and report the outcome.
    Attempt,
    /// Show node id, sentinel state and published cluster values.
    Status,
    /// Inspect or seed the local coordination store replica.
    Store {
        #[command(subcommand)]
        op: StoreOp,
    },
}

#[derive(Subcommand)]
enum StoreOp {
    Get { namespace: String, key: String },
    Set { namespace: String, key: String, value: String },
    List { namespace: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = RolebootConfig::load_or_default(&cli.config)?;

    match cli.command {
        Command::Run { interval } => {
            if let Some(secs) = interval {
                config.interval_secs = secs;
            }
            run(config).await
        }
        Command::Attempt => attempt(&config),
        Command::Status => status(&config),
        Command::Store { op } => store(&config, op),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rolebootd=debug,roleboot=debug".into());
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: RolebootConfig) -> anyhow::Result<ExitCode> {
    info!("rolebootd starting");
    std::fs::create_dir_all(&config.data_dir)?;

    let store = open_store(&config)?;
    let bootstrap = build_bootstrap(&config, store)?;
    let scheduler = BootstrapScheduler::new(bootstrap, config.interval());

    // ── Shutdown signal ──────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for shutdown signal");
                // Never resolves, so `shutdown_tx` stays alive and the
                // scheduler keeps its interval.
                std::future::pending::<()>().await;
            }
        }
    });

    match scheduler.run(shutdown_rx).await? {
        SchedulerExit::Completed(completion) => {
            info!(?completion, "rolebootd finished");
            Ok(ExitCode::SUCCESS)
        }
        SchedulerExit::Fatal(e) => {
            eprintln!("bootstrap failed: {e}");
            Ok(ExitCode::FAILURE)
        }
        SchedulerExit::Shutdown => Ok(ExitCode::SUCCESS),
    }
}

fn attempt(config: &RolebootConfig) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;
    let mut bootstrap = build_bootstrap(config, store)?;

    match bootstrap.attempt() {
        BootstrapOutcome::Completed(completion) => {
            println!("completed ({completion:?})");
            Ok(ExitCode::SUCCESS)
        }
        BootstrapOutcome::Deferred(reason) => {
            println!("deferred: {reason}");
            Ok(ExitCode::SUCCESS)
        }
        BootstrapOutcome::Failed(e) => {
            println!("failed ({:?}): {e}", e.severity());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn status(config: &RolebootConfig) -> anyhow::Result<ExitCode> {
    let node_id = config.node_id()?;
    let store = open_store(config)?;
    let sentinel = FileSentinel::new(config.sentinel_path());
    let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    println!("node id:        {node_id}");
    println!("bootstrapped:   {}", sentinel.exists());
    println!("role:           {}", show(store.get_value(ROLE_NAMESPACE, &node_id)?));
    println!("address:        {}", show(store.get_value(IP_NAMESPACE, &node_id)?));
    println!(
        "leader address: {}",
        show(store.get_value(CLUSTER_NAMESPACE, LEADER_ADDRESS_KEY)?)
    );
    Ok(ExitCode::SUCCESS)
}

fn store(config: &RolebootConfig, op: StoreOp) -> anyhow::Result<ExitCode> {
    let store = open_store(config)?;
    match op {
        StoreOp::Get { namespace, key } => match store.get_value(&namespace, &key)? {
            Some(value) => println!("{value}"),
            None => return Ok(ExitCode::FAILURE),
        },
        StoreOp::Set {
            namespace,
            key,
            value,
        } => store.put_value(&namespace, &key, &value)?,
        StoreOp::List { namespace } => {
            for (key, value) in store.list_namespace(&namespace)? {
                println!("{key}\t{value}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
