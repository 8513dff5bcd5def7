use std::{env, path::PathBuf, time::Duration};

use url::Url;

use super::env::{
    AppConfig, BatchConfig, ConfigError, DatasetConfig, DirectoryConfig, LoggingConfig,
    TranslationConfig,
};

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let dataset = DatasetConfig {
            path: PathBuf::from(var("DATASET_PATH").unwrap_or_else(|| "dataset/spam.csv".to_string())),
        };

        let translation = TranslationConfig {
            enabled: match var("TRANSLATION_ENABLED") {
                Some(value) => parse_bool("TRANSLATION_ENABLED", &value)?,
                None => true,
            },
            endpoint: parse_endpoint(
                var("TRANSLATE_ENDPOINT")
                    .as_deref()
                    .unwrap_or(DEFAULT_TRANSLATE_ENDPOINT),
            )?,
            target_language: var("TARGET_LANGUAGE").unwrap_or_else(|| "en".to_string()),
            timeout: Duration::from_millis(
                var("TRANSLATE_TIMEOUT_MS")
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(5_000),
            ),
        };

        let batch = BatchConfig {
            concurrency: var("BATCH_CONCURRENCY")
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(4),
            output_filename: var("OUTPUT_FILENAME")
                .unwrap_or_else(|| "classified_spam.csv".to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            output_dir: var("OUTPUT_DIR").unwrap_or_else(|| "output".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        Ok(Self {
            dataset,
            translation,
            batch,
            directories,
            logging,
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| ConfigError::Invalid {
            key: "TRANSLATE_ENDPOINT",
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.dataset.path, PathBuf::from("dataset/spam.csv"));
        assert!(cfg.translation.enabled);
        assert_eq!(cfg.translation.endpoint.as_str(), DEFAULT_TRANSLATE_ENDPOINT);
        assert_eq!(cfg.translation.target_language, "en");
        assert_eq!(cfg.translation.timeout, Duration::from_secs(5));
        assert_eq!(cfg.batch.concurrency, 4);
        assert_eq!(cfg.batch.output_filename, "classified_spam.csv");
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config(&[
            ("TRANSLATION_ENABLED", "off"),
            ("TRANSLATE_TIMEOUT_MS", "250"),
            ("BATCH_CONCURRENCY", "0"),
            ("OUTPUT_DIR", "exports"),
        ])
        .unwrap();
        assert!(!cfg.translation.enabled);
        assert_eq!(cfg.translation.timeout, Duration::from_millis(250));
        assert_eq!(cfg.batch.concurrency, 4);
        assert_eq!(cfg.directories.output_dir, "exports");
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        let err = config(&[("TRANSLATION_ENABLED", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TRANSLATION_ENABLED", .. }));
    }

    #[test]
    fn endpoint_must_be_an_http_url() {
        let cfg = config(&[("TRANSLATE_ENDPOINT", "http://localhost:8080/translate")]).unwrap();
        assert_eq!(cfg.translation.endpoint.port(), Some(8080));

        for bad in ["not a url", "ftp://example.org/translate"] {
            let err = config(&[("TRANSLATE_ENDPOINT", bad)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "TRANSLATE_ENDPOINT", .. }));
        }
    }
}
