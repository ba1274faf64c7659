use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ihexmap::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("logger setup failed: {0}")]
    Logger(#[from] flexi_logger::FlexiLoggerError),
    #[error("cannot infer output format from '{}', use --format", .0.display())]
    UnknownOutputFormat(PathBuf),
}

impl From<ihexmap::ConfigError> for CliError {
    fn from(err: ihexmap::ConfigError) -> Self {
        Self::Core(err.into())
    }
}

impl From<ihexmap::ExportError> for CliError {
    fn from(err: ihexmap::ExportError) -> Self {
        Self::Core(err.into())
    }
}
