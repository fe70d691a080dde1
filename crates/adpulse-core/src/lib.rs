pub mod aggregate;
pub mod app_config;
pub mod campaigns;
pub mod config;
pub mod export;
pub mod format;
pub mod metrics;
pub mod seed;

pub use aggregate::{
    aggregate, aggregate_by_day, validate_funnel, AggregateResult, DailyAggregate, FunnelWarning,
};
pub use app_config::{AppConfig, Environment};
pub use campaigns::{Campaign, CampaignPatch, CampaignStatus, NewCampaign};
pub use config::{load_app_config, load_app_config_from_env};
pub use export::{ExportError, Overview};
pub use format::{format_currency, format_number, format_percentage, format_roas, FormatError};
pub use metrics::{MetricRecord, NewMetricRecord, RawNumber};
pub use seed::{load_seed_file, SeedCampaign, SeedFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[source] serde_yaml::Error),

    #[error("seed file validation failed: {0}")]
    Validation(String),
}
