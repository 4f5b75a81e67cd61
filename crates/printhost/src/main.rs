// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! printhost - printer configuration tool.
//!
//! Binary entry point: loads host settings, then reads, checks or rewrites
//! the printer configuration file they point at.

mod check;
mod restart;
mod save;
mod status;

use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use printhost_config::{ConfigManager, HostSettings};
use printhost_core::{LocalFs, PrintHostError};

/// printhost - printer configuration tool.
#[derive(Parser, Debug)]
#[command(name = "printhost", version, about, long_about = None)]
struct Cli {
    /// Printer config file to operate on, overriding `printer.config_path`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply changes and rewrite the config file (SAVE_CONFIG).
    SaveConfig {
        /// Do not request a restart after saving.
        #[arg(long)]
        no_restart: bool,
        /// Do not keep a timestamped backup of the previous file.
        #[arg(long)]
        no_backup: bool,
        /// Rewrite obsolete options to their current form.
        #[arg(long)]
        migrate: bool,
        /// Set an option; may be repeated.
        #[arg(long = "set", value_name = "SECTION/OPTION=VALUE")]
        set: Vec<String>,
        /// Remove a whole section; may be repeated.
        #[arg(long = "remove-section", value_name = "NAME")]
        remove_section: Vec<String>,
    },
    /// Show the configuration status snapshot.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Run diagnostic checks against the config file.
    Check {
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration.
    Dump,
}

fn main() {
    let cli = Cli::parse();

    let mut settings = match printhost_config::load_and_validate() {
        Ok(settings) => settings,
        Err(errors) => {
            printhost_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.config {
        settings.printer.config_path = path;
    }

    init_tracing(&settings.log.level);

    let result = match cli.command {
        Some(Commands::SaveConfig {
            no_restart,
            no_backup,
            migrate,
            set,
            remove_section,
        }) => {
            let args = save::SaveArgs {
                no_restart,
                no_backup,
                migrate,
                set,
                remove_section,
            };
            let mut manager = manager_for(&settings);
            save::run_save_config(&mut manager, &args).map(|outcome| save::print_outcome(&outcome))
        }
        Some(Commands::Status { json, plain }) => status::run_status(&manager_for(&settings), json, plain),
        Some(Commands::Check { plain }) => check::run_check(&LocalFs, &manager_for(&settings), &settings, plain),
        Some(Commands::Dump) => run_dump(&manager_for(&settings)),
        None => {
            println!("printhost: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("printhost: {err}");
        std::process::exit(1);
    }
}

fn manager_for(settings: &HostSettings) -> ConfigManager {
    ConfigManager::from_settings(settings, Rc::new(LocalFs), Rc::new(restart::NoticeRestart))
}

fn run_dump(manager: &ConfigManager) -> Result<(), PrintHostError> {
    let read = manager.read_main_config()?;
    println!("{}", manager.log_config(&read));
    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` wins over the settings level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("printhost={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
