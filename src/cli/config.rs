//! Configuration command

use clap::Subcommand;
use handoff_core::{error::Result, HandoffConfig};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Print the inbound scheme://host this app accepts
    Expected,
}

/// Handle configuration command
pub fn handle(config: &HandoffConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Expected => {
            println!("{}", config.codec().expected());
        }
    }
    Ok(())
}
