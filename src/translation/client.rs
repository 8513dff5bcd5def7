use futures::{future::BoxFuture, FutureExt};
use reqwest::Client;
use serde_json::Value;

use crate::config::TranslationConfig;

use super::{
    response::{parse_detected_language, parse_detection, parse_translation, TranslateQuery},
    Detection, TranslationError, Translator,
};

#[derive(Clone)]
pub struct GoogleTranslator {
    http: Client,
    config: TranslationConfig,
}

impl GoogleTranslator {
    pub fn new(http: Client, config: TranslationConfig) -> Self {
        Self { http, config }
    }

    async fn request(&self, text: &str, target: &str) -> Result<Value, TranslationError> {
        let response = self
            .http
            .get(self.config.endpoint.clone())
            .query(&TranslateQuery::new(text, target))
            .timeout(self.config.timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}

impl Translator for GoogleTranslator {
    fn detect<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, TranslationError>> {
        async move {
            let body = self.request(text, &self.config.target_language).await?;
            parse_detected_language(&body)
        }
        .boxed()
    }

    fn translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<String, TranslationError>> {
        async move {
            let body = self.request(text, target).await?;
            parse_translation(&body)
        }
        .boxed()
    }

    // The endpoint reports the source language alongside every translation.
    fn detect_and_translate<'a>(
        &'a self,
        text: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, Result<Detection, TranslationError>> {
        async move {
            let body = self.request(text, target).await?;
            parse_detection(&body, target)
        }
        .boxed()
    }
}
