//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "basic-auth-mediator")]
#[command(about = "OpenHIM mediator injecting per-client Basic credentials upstream", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/mediator.toml")]
    pub config: PathBuf,

    /// Do not register with the OpenHIM core; use the file's [config] section
    #[arg(long)]
    pub no_register: bool,

    /// Override the listener bind address
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl Cli {
    /// Apply command-line overrides to a loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if self.no_register {
            config.api.register = false;
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
    }
}
