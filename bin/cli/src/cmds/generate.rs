use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use compass_generator::settings::DEFAULT_SETTINGS_FILE;
use compass_generator::{GenerationSummary, Generator, GeneratorSettings};
use eventcatalog::fs::FsCatalog;

#[derive(Parser, Debug)]
#[command(about = "Generate EventCatalog services from Compass components")]
pub(crate) struct GenerateCommand {
    #[arg(
        default_value = DEFAULT_SETTINGS_FILE,
        help = "Generator settings file"
    )]
    pub settings: PathBuf,

    #[arg(
        long,
        env = "PROJECT_DIR",
        help = "EventCatalog directory the generated entities are written to"
    )]
    pub project_dir: PathBuf,

    #[arg(long, help = "Log what would be written without changing the catalog")]
    pub dry_run: bool,
}

impl GenerateCommand {
    pub(crate) fn load_settings(&self) -> Result<GeneratorSettings> {
        let mut settings = GeneratorSettings::from_path(&self.settings)
            .with_context(|| format!("failed to load {}", self.settings.display()))?;
        settings.dry_run |= self.dry_run;
        Ok(settings)
    }
}

pub(crate) async fn invoke(
    project_dir: PathBuf,
    settings: GeneratorSettings,
) -> Result<GenerationSummary> {
    let catalog = Arc::new(FsCatalog::new(project_dir));
    let summary = Generator::new(settings, catalog).run().await?;
    Ok(summary)
}
