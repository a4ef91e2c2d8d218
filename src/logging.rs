use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "blurcard=debug"). `file` redirects output away from stderr, which the
/// interactive mode draws over.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub file: Option<PathBuf>,
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let target = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(env_logger::Target::Pipe(Box::new(file)))
        }
        None => None,
    };

    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        if let Some(target) = target {
            builder.target(target);
            builder.write_style(env_logger::WriteStyle::Never);
        }

        // Another logger may already be installed (tests)
        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
    Ok(())
}
