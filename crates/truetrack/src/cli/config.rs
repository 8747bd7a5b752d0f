//! `truetrack config`: resolved paths and effective settings.

use anyhow::Result;
use truetrack::config::{config_path, Settings};
use truetrack_logging::{logs_dir, truetrack_home};

use crate::cli::error::HelpfulError;

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths and settings in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let home = truetrack_home();
    let logs = logs_dir();
    let config_file = config_path();
    let settings = Settings::load().map_err(HelpfulError::from)?;

    if args.json {
        let config = serde_json::json!({
            "home": home.to_string_lossy(),
            "logs_dir": logs.to_string_lossy(),
            "config_file": {
                "path": config_file.to_string_lossy(),
                "exists": config_file.exists(),
            },
            "settings": settings,
        });
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("TRUETRACK CONFIGURATION");
        println!("=======================");
        println!();
        println!("Home:     {}", home.display());
        println!("Logs:     {}", logs.display());
        println!(
            "Config:   {} ({})",
            config_file.display(),
            if config_file.exists() { "exists" } else { "defaults" }
        );
        println!();
        println!("[scan]");
        println!("  facing               = {}", settings.scan.facing);
        println!("  frame_interval_ms    = {}", settings.scan.frame_interval_ms);
        println!("  frames_before_decode = {}", settings.scan.frames_before_decode);
        println!("[camera]");
        println!("  deny_permission      = {}", settings.camera.deny_permission);
    }

    Ok(())
}
