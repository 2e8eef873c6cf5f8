//! Effective configuration display

use crate::app::OutputFormat;
use anyhow::Result;
use ragserve_core::Config;

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let mut shown = config.clone();
    shown.providers = shown.providers.redacted();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Cli | OutputFormat::Md => {
            println!("# database: {}", config.database_path().display());
            print!("{}", serde_yaml::to_string(&shown)?);
        }
    }
    Ok(())
}
