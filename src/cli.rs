//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use git_form::output::OutputConfig;
use git_form::settings::Settings;

use crate::commands;

/// git-form - Save the layout of your git repositories and rebuild it anywhere
#[derive(Parser, Debug)]
#[command(name = "git-form")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Path to the settings file.
    ///
    /// Defaults to `~/.git-form/settings.yaml`, which is created with default
    /// values if it does not exist.
    #[arg(long, global = true, value_name = "FILE", env = "GIT_FORM_SETTINGS")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record every repository below the root directory in the store
    Save(commands::save::SaveArgs),

    /// Clone every repository recorded in the store that is missing locally
    Load(commands::load::LoadArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Save(args) => {
                let settings = load_settings(self.settings)?;
                commands::save::execute(args, &settings, &output)
            }
            Commands::Load(args) => {
                let settings = load_settings(self.settings)?;
                commands::load::execute(args, &settings, &output)
            }
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Sets up `env_logger`. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let path = path.unwrap_or_else(git_form::defaults::default_settings_file);
    Settings::load_or_init(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}
