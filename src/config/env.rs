use std::{path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub translation: TranslationConfig,
    pub batch: BatchConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub endpoint: Url,
    pub target_language: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub concurrency: usize,
    pub output_filename: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for environment variable {key}")]
    Invalid { key: &'static str, value: String },
}
