//! SafeHer CLI
//!
//! Drives the alert flow against a simulated device.
//!
//! # Usage
//! ```bash
//! safeher [--config safeher.json] [--platform android] [--verbose] [--json] trigger
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use safeher_core::{
    bootstrap, AlertOrchestrator, Capability, Contact, ContactId, DeviceBindings, FileLaunchFlag,
    JsonFileDirectory, LocationProvider, PermissionGate, PermissionState, Platform, Route,
    SafeherConfig, SimulatedDevice, StaticAuth,
};

/// SafeHer - panic-button alerts to trusted contacts
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (missing file means defaults)
    #[arg(short, long, value_name = "FILE", default_value = "safeher.json", global = true)]
    config: PathBuf,

    /// Override the runtime platform (android, ios, web)
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an emergency alert to every contact
    Trigger,

    /// Take a single location fix
    Locate,

    /// Show the permission state
    Permissions {
        /// Prompt for every capability instead of only checking
        #[arg(long)]
        request: bool,
    },

    /// Resolve the startup route
    Route {
        /// Treat the user as signed in
        #[arg(long)]
        authenticated: bool,
    },

    /// Manage emergency contacts
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List contacts
    List,

    /// Add a contact
    Add { name: String, phone: String },

    /// Remove a contact by id
    Remove { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteView {
    route: Route,
    path: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PermissionView {
    platform: Platform,
    #[serde(flatten)]
    state: PermissionState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(&cli.config, cli.platform)?;
    init_tracing(cli.verbose, &config.logging.level);

    tracing::debug!("Loaded configuration for {}", config.platform);

    match cli.command {
        Commands::Trigger => {
            let device = Arc::new(SimulatedDevice::new(config.device.clone()));
            let directory = Arc::new(JsonFileDirectory::new(&config.contacts_path));
            let orchestrator =
                AlertOrchestrator::from_config(&config, directory, DeviceBindings::from_device(device))?;

            let outcome = orchestrator.trigger().await;
            if cli.json {
                println!("{}", serde_json::to_string(&outcome)?);
            } else if let Some(sent_to) = outcome.sent_to() {
                println!("✅ Emergency alert sent to {} contacts", sent_to);
            } else if let Some(error) = outcome.error() {
                println!("❌ {}", error);
            }

            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Locate => {
            let device = Arc::new(SimulatedDevice::new(config.device.clone()));
            let gate = PermissionGate::new(config.platform, device.clone());
            let provider = LocationProvider::new(gate, device).with_accuracy(config.location.accuracy);

            let fix = provider.acquire().await?;
            if cli.json {
                println!("{}", serde_json::to_string(&fix)?);
            } else {
                println!("📍 {:.6}, {:.6}", fix.latitude, fix.longitude);
                if let Some(accuracy) = fix.accuracy_m {
                    println!("   accuracy: {:.1} m", accuracy);
                }
                println!("   {}", safeher_core::composer::map_link(fix.latitude, fix.longitude));
            }
        }
        Commands::Permissions { request } => {
            let device = Arc::new(SimulatedDevice::new(config.device.clone()));
            let gate = PermissionGate::new(config.platform, device);

            let state = if request { gate.request_all().await } else { gate.check_all().await };
            if cli.json {
                let view = PermissionView {
                    platform: config.platform,
                    state,
                };
                println!("{}", serde_json::to_string(&view)?);
            } else {
                println!("Platform: {}", config.platform);
                for capability in Capability::ALL {
                    let mark = if state.get(capability) { "granted" } else { "denied" };
                    println!("   {:<14} {}", capability.to_string(), mark);
                }
            }
        }
        Commands::Route { authenticated } => {
            let store = FileLaunchFlag::new(config.launch_flag_path());
            let route = bootstrap(&store, &StaticAuth(authenticated)).await;
            if cli.json {
                let view = RouteView {
                    route,
                    path: route.path(),
                };
                println!("{}", serde_json::to_string(&view)?);
            } else {
                println!("{}", route);
            }
        }
        Commands::Contacts { action } => {
            let directory = JsonFileDirectory::new(&config.contacts_path);
            match action {
                ContactsAction::List => {
                    let contacts = directory.load().await?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&contacts)?);
                    } else if contacts.is_empty() {
                        println!("No emergency contacts in {:?}", directory.path());
                    } else {
                        for contact in &contacts {
                            println!("{}  {}  {}", contact.id, contact.name, contact.phone);
                        }
                    }
                }
                ContactsAction::Add { name, phone } => {
                    let contact = directory.add(Contact::new(name, phone)).await?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&contact)?);
                    } else {
                        println!("Added {} ({})", contact.name, contact.id);
                    }
                }
                ContactsAction::Remove { id } => {
                    let removed = directory.remove(&ContactId::from(id)).await?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&removed)?);
                    } else {
                        println!("Removed {} ({})", removed.name, removed.id);
                    }
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => {
                write_default_config(&cli.config, force)?;
                println!("Configuration written to {:?}", cli.config);
            }
        },
    }

    Ok(())
}

/// File, then environment, then command line.
fn load_config(path: &Path, platform: Option<Platform>) -> anyhow::Result<SafeherConfig> {
    let mut config = SafeherConfig::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {:?}", path))?;
    config.apply_env_overrides()?;
    if let Some(platform) = platform {
        config.platform = platform;
    }
    config.validate()?;
    Ok(config)
}

fn write_default_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists, pass --force to overwrite", path);
    }
    SafeherConfig::default().to_file(path)?;
    Ok(())
}

fn init_tracing(verbose: bool, level: &str) {
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over both the flag and the config file
    let directive = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}
