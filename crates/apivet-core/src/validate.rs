//! Submission handling: stage, validate, summarize, clean up.
//!
//! `Validator::submit` is the single entry point. It never returns an error;
//! every failure is folded into `ValidationOutcome::Invalid`. Requests share no
//! mutable state, so one `Validator` serves any number of concurrent
//! submissions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StagingStrategy};
use crate::openapi::{ApiSummary, DocumentValidator, OpenApiContext, OpenApiValidator};
use crate::staging::StagedArtifact;
use crate::Error;

/// Result of validating one submission
#[derive(Debug)]
pub enum ValidationOutcome {
    Valid(ApiSummary),
    Invalid(Error),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

impl From<crate::Result<ApiSummary>> for ValidationOutcome {
    fn from(result: crate::Result<ApiSummary>) -> Self {
        match result {
            Ok(summary) => ValidationOutcome::Valid(summary),
            Err(error) => ValidationOutcome::Invalid(error),
        }
    }
}

pub struct Validator {
    staging: StagingStrategy,
    temp_dir: PathBuf,
    timeout: Duration,
    document_validator: Arc<dyn DocumentValidator>,
}

impl Validator {
    /// Build a validator from configuration, using `OpenApiValidator`
    pub fn new(config: &Config) -> Self {
        Self {
            staging: config.staging,
            temp_dir: config.resolved_temp_dir(),
            timeout: config.validation_timeout(),
            document_validator: Arc::new(OpenApiValidator),
        }
    }

    /// Replace the document validator
    pub fn with_document_validator<V>(mut self, validator: V) -> Self
    where
        V: DocumentValidator + 'static,
    {
        self.document_validator = Arc::new(validator);
        self
    }

    pub fn staging(&self) -> StagingStrategy {
        self.staging
    }

    /// Validate one submitted document.
    pub async fn submit(&self, content: &str) -> ValidationOutcome {
        let result = match self.staging {
            StagingStrategy::InMemory => self.submit_in_memory(content).await,
            StagingStrategy::TempFile => self.submit_staged(content).await,
        };
        let outcome = ValidationOutcome::from(result);

        match &outcome {
            ValidationOutcome::Valid(summary) => log::info!(
                "Validated \"{}\" {} (spec {})",
                summary.info.title,
                summary.info.version,
                summary.spec_version()
            ),
            ValidationOutcome::Invalid(error) => {
                log::info!("Rejected submission [{}]: {}", error.kind(), error)
            }
        }
        outcome
    }

    async fn submit_in_memory(&self, content: &str) -> crate::Result<ApiSummary> {
        let content = content.to_owned();
        self.run_bounded(move || OpenApiContext::parse_content(&content))
            .await
    }

    async fn submit_staged(&self, content: &str) -> crate::Result<ApiSummary> {
        let artifact = StagedArtifact::create(&self.temp_dir, content).await?;

        let result = match OpenApiContext::from_file(artifact.path()).await {
            Ok(document) => self.run_bounded(move || Ok(document)).await,
            Err(Error::Io(e)) => Err(Error::artifact_io(format!(
                "failed to read staging file {}: {}",
                artifact.path().display(),
                e
            ))),
            Err(e) => Err(e),
        };

        // A failed removal is reported but never replaces the outcome.
        let path = artifact.path().to_path_buf();
        if let Err(e) = artifact.close() {
            log::warn!(
                "Failed to remove staging file {} [artifact_io]: {}",
                path.display(),
                e
            );
        }
        result
    }

    /// Load and validate off the async executor, bounded by the configured timeout.
    async fn run_bounded<F>(&self, load: F) -> crate::Result<ApiSummary>
    where
        F: FnOnce() -> crate::Result<OpenApiContext> + Send + 'static,
    {
        let validator = Arc::clone(&self.document_validator);
        let task = tokio::task::spawn_blocking(move || {
            let document = load()?;
            validator.validate(document)?.summary()
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                log::error!("Validator task failed: {}", join_error);
                Err(Error::validation(
                    "The validator failed unexpectedly while checking this document",
                ))
            }
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }
}
