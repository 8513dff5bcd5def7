use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::sync::mpsc;

use crate::{
    classifier::{load_dataset, SpamClassifier},
    config::AppConfig,
    domain::{AnnotatedRecord, Normalization},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    phishing::suspicious_urls,
    pipeline::{AnnotationPipeline, BatchSummary, MessageTable},
    translation::{GoogleTranslator, LanguageNormalizer},
};

const HELP: &str = "\
Type a message and press enter to classify it.
  :columns <file.csv>          list the columns of a CSV file
  :batch <file.csv> <column>   classify every row of a CSV file
  :help                        show this help
  :quit                        exit
Lines starting with `:` that are not one of these are classified as messages.";

const STDIN_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Classify(String),
    Blank,
    Columns(PathBuf),
    Batch { path: PathBuf, column: String },
    Help,
    Quit,
    /// A known command with missing arguments.
    Usage(&'static str),
}

impl Command {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Blank;
        }
        let Some(rest) = trimmed.strip_prefix(':') else {
            return Command::Classify(trimmed.to_string());
        };

        let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let args = args.trim();
        match name {
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "columns" if args.is_empty() => Command::Usage(":columns <file.csv>"),
            "columns" => Command::Columns(PathBuf::from(args)),
            "batch" => match args.split_once(char::is_whitespace) {
                Some((path, column)) if !column.trim().is_empty() => Command::Batch {
                    path: PathBuf::from(path),
                    column: column.trim().to_string(),
                },
                _ => Command::Usage(":batch <file.csv> <column>"),
            },
            _ => Command::Classify(trimmed.to_string()),
        }
    }
}

pub struct SpamSieveApp {
    pipeline: AnnotationPipeline,
    config: Arc<AppConfig>,
    paths: ResolvedPaths,
    shutdown: Shutdown,
}

impl SpamSieveApp {
    /// Trains the model and wires the pipeline. Any dataset or training
    /// problem is fatal.
    pub fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let dataset = load_dataset(&config.dataset.path).with_context(|| {
            format!(
                "failed to load training data from {}",
                config.dataset.path.display()
            )
        })?;
        let classifier =
            Arc::new(SpamClassifier::train(&dataset).context("failed to train spam model")?);

        let normalizer = if config.translation.enabled {
            let http_client = Client::builder()
                .user_agent(format!("spam-sieve/{}", env!("CARGO_PKG_VERSION")))
                .build()?;
            let translator = Arc::new(GoogleTranslator::new(
                http_client,
                config.translation.clone(),
            ));
            LanguageNormalizer::new(
                translator,
                config.translation.target_language.clone(),
                config.translation.timeout,
            )
        } else {
            tracing::info!(target: "app", "translation disabled");
            LanguageNormalizer::disabled()
        };

        let pipeline = AnnotationPipeline::new(normalizer, classifier, config.batch.concurrency);

        Ok(Self {
            pipeline,
            config,
            paths,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!(target: "app", "spam classifier ready");
        println!("Spam Message Classifier\n{HELP}");
        self.run_with_lines(spawn_stdin_reader()).await
    }

    /// Serves lines until the sender hangs up, `:quit`, or shutdown.
    async fn run_with_lines(&self, mut lines: mpsc::Receiver<io::Result<String>>) -> Result<()> {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if shutdown.is_triggered() {
                break;
            }
            let line = tokio::select! {
                line = lines.recv() => line,
                _ = shutdown.notified() => {
                    tracing::info!(target: "app", "shutdown requested");
                    break;
                }
            };
            let Some(line) = line else {
                break;
            };
            let line = line.context("failed to read from stdin")?;

            match Command::parse(&line) {
                Command::Classify(text) => {
                    let record = self.pipeline.annotate(&text).await;
                    print_record(&record);
                }
                Command::Blank => println!("Please type something."),
                Command::Columns(path) => match read_table(&path).await {
                    Ok(table) => {
                        println!("Columns: {}", table.columns().collect::<Vec<_>>().join(", "))
                    }
                    Err(err) => println!("Error: {err:#}"),
                },
                Command::Batch { path, column } => match self.run_batch(&path, &column).await {
                    Ok((output, summary)) => {
                        println!("Classification complete: {summary}");
                        println!("Saved to {}", output.display());
                    }
                    Err(err) => {
                        tracing::warn!(target: "app", error = %err, path = %path.display(), "batch failed");
                        println!("Error: {err:#}");
                    }
                },
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Usage(usage) => println!("Usage: {usage}"),
            }
        }

        tracing::info!(target: "app", "spam classifier stopped");
        Ok(())
    }

    async fn run_batch(&self, path: &Path, column: &str) -> Result<(PathBuf, BatchSummary)> {
        let table = read_table(path).await?;
        let cells = table.message_cells(column)?;
        if table.is_empty() {
            tracing::warn!(target: "app", path = %path.display(), "uploaded table has no rows");
        }
        tracing::info!(target: "app", rows = table.len(), column, "classifying uploaded table");

        let outcomes = self.pipeline.annotate_batch(cells).await;
        let summary = BatchSummary::new(&outcomes, table.skipped());

        let mut buffer = Vec::new();
        table.write_annotated(&outcomes, &mut buffer)?;
        let output = self.paths.output_dir.join(&self.config.batch.output_filename);
        tokio::fs::write(&output, buffer)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;

        tracing::info!(target: "app", %summary, output = %output.display(), "batch complete");
        Ok((output, summary))
    }
}

/// Blocking stdin reads live on their own thread so a pending read never
/// holds the runtime open after shutdown. The thread stops once the
/// receiver is gone.
fn spawn_stdin_reader() -> mpsc::Receiver<io::Result<String>> {
    let (sender, receiver) = mpsc::channel(STDIN_BUFFER);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let failed = line.is_err();
            if sender.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    receiver
}

async fn read_table(path: &Path) -> Result<MessageTable> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(MessageTable::from_reader(&bytes[..])?)
}

fn print_record(record: &AnnotatedRecord) {
    match &record.normalization {
        Normalization::Translated {
            text,
            source_language,
        } => println!("Translated ({source_language}): {text}"),
        Normalization::Fallback { reason, .. } => println!("(translation unavailable: {reason})"),
        Normalization::Unchanged { .. } => {}
    }
    println!("Prediction: {}", record.classification.label);
    println!("Confidence Score: {:.2}%", record.classification.confidence);
    if record.phishing {
        println!("Phishing link detected!");
        for suspicious in suspicious_urls(&record.original) {
            println!("  {} (matched \"{}\")", suspicious.url, suspicious.keyword);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::classifier::fixtures;

    #[test]
    fn plain_text_is_classified() {
        assert_eq!(
            Command::parse("  WIN a prize  "),
            Command::Classify("WIN a prize".into())
        );
        assert_eq!(Command::parse("   "), Command::Blank);
    }

    #[test]
    fn batch_takes_path_and_column_with_spaces() {
        assert_eq!(
            Command::parse(":batch uploads/sms.csv Message Text"),
            Command::Batch {
                path: PathBuf::from("uploads/sms.csv"),
                column: "Message Text".into(),
            }
        );
        assert!(matches!(Command::parse(":batch only.csv"), Command::Usage(_)));
    }

    #[test]
    fn control_commands_parse() {
        assert_eq!(Command::parse(":columns a.csv"), Command::Columns(PathBuf::from("a.csv")));
        assert_eq!(Command::parse(":help"), Command::Help);
        assert_eq!(Command::parse(":quit"), Command::Quit);
        assert_eq!(Command::parse(":exit"), Command::Quit);
        assert!(matches!(Command::parse(":columns"), Command::Usage(_)));
    }

    #[test]
    fn colon_prefixed_messages_are_classified() {
        assert_eq!(
            Command::parse(":) claim your free prize"),
            Command::Classify(":) claim your free prize".into())
        );
        assert_eq!(
            Command::parse(":frobnicate now"),
            Command::Classify(":frobnicate now".into())
        );
        assert_eq!(Command::parse(":"), Command::Classify(":".into()));
    }

    fn test_app(output_dir: &Path) -> SpamSieveApp {
        let config = AppConfig::from_lookup(|_| None).expect("default config");
        let pipeline = AnnotationPipeline::new(
            LanguageNormalizer::disabled(),
            Arc::new(fixtures::classifier()),
            2,
        );
        SpamSieveApp {
            pipeline,
            config: Arc::new(config),
            paths: ResolvedPaths {
                logs_dir: output_dir.to_path_buf(),
                output_dir: output_dir.to_path_buf(),
            },
            shutdown: Shutdown::new(),
        }
    }

    #[tokio::test]
    async fn shutdown_ends_a_session_waiting_for_input() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let (sender, receiver) = mpsc::channel(1);
        sender.send(Ok("win a free prize".to_string())).await.unwrap();

        let shutdown = app.shutdown.clone();
        let session = tokio::spawn(async move { app.run_with_lines(receiver).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(2), session)
            .await
            .expect("session stopped after shutdown")
            .expect("session task finished")
            .unwrap();
        // the input source is still open
        drop(sender);
    }

    #[tokio::test]
    async fn session_ends_on_quit_or_closed_input() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());

        let (sender, receiver) = mpsc::channel(4);
        sender.send(Ok(":help".to_string())).await.unwrap();
        sender.send(Ok(":quit".to_string())).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), app.run_with_lines(receiver))
            .await
            .expect("quit ends the session")
            .unwrap();
        drop(sender);

        let (sender, receiver) = mpsc::channel(1);
        drop(sender);
        tokio::time::timeout(Duration::from_secs(2), app.run_with_lines(receiver))
            .await
            .expect("closed input ends the session")
            .unwrap();
    }

    #[tokio::test]
    async fn read_errors_end_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let (sender, receiver) = mpsc::channel(1);
        sender
            .send(Err(io::Error::new(io::ErrorKind::InvalidData, "not utf-8")))
            .await
            .unwrap();
        let err = app.run_with_lines(receiver).await.unwrap_err();
        assert!(err.to_string().contains("stdin"));
    }
}
