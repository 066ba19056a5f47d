use annotator::runner;
use annotator::utils::tracing::init_tracer;
use common::configuration::Configuration;
use common::consts::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use std::env;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // loading annotator_config.yaml (before logging init so we can read the logging section)
    let config_path = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    eprintln!(
        "loading annotator configuration from {}",
        config_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    );

    let (config, source) = Configuration::load(config_path.as_deref())?;

    init_tracer(config.logging.as_ref());
    info!(
        source = %source,
        categories = config.categories.len(),
        intents = config.intents.len(),
        data_dir = %config.settings.data_dir.display(),
        "loaded configuration"
    );

    let summary = runner::run(config).await?;
    if summary.files_skipped > 0 {
        info!(skipped = summary.files_skipped, "some input files were skipped");
    }
    info!("analysis finished");
    Ok(())
}
