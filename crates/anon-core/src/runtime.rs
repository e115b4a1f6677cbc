//! Long-lived relay state: the detector and transformer built once from
//! configuration and shared by every cycle.

use anon_config::{RelayConfig, TransformerConfig, TransformerKind};
use anon_redact::{
    CycleOutcome, EchoTransformer, PatternDetector, Pipeline, PipelineOptions, Redaction,
    RedactionError, RestoreMode, Transformer,
};
use thiserror::Error;
use tracing::info;

use crate::exit_codes::ExitCode;

/// Errors raised while building the relay from configuration.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("detector setup failed: {0}")]
    Detector(#[from] RedactionError),

    #[error("environment variable {var} is not set (transformer.api_key_env)")]
    MissingApiKey { var: String },

    #[error("transformer kind `{kind}` requires the `{feature}` feature")]
    FeatureDisabled {
        kind: TransformerKind,
        feature: &'static str,
    },
}

impl RuntimeError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RuntimeError::Detector(e) => ExitCode::from_error(e),
            RuntimeError::MissingApiKey { .. } => ExitCode::ConfigError,
            RuntimeError::FeatureDisabled { .. } => ExitCode::CapabilityError,
        }
    }
}

/// Detector, transformer and cycle options.
///
/// Holds no per-cycle state: every call to [`Relay::process`] gets a fresh
/// mapping store, so one `Relay` can be shared across threads.
pub struct Relay {
    detector: PatternDetector,
    transformer: Box<dyn Transformer>,
    options: PipelineOptions,
}

impl Relay {
    /// Build from parts.
    pub fn new(
        detector: PatternDetector,
        transformer: Box<dyn Transformer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            detector,
            transformer,
            options,
        }
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RuntimeError> {
        let detector = PatternDetector::from_policy(&config.detection)?;
        let transformer = build_transformer(&config.transformer)?;
        let options = PipelineOptions {
            restore_mode: config.restore.mode,
        };

        info!(
            recognizers = detector.entity_types().len(),
            transformer = transformer.name(),
            restore_mode = %options.restore_mode,
            "relay ready"
        );

        Ok(Self::new(detector, transformer, options))
    }

    /// Same relay with a different restore mode.
    pub fn with_restore_mode(mut self, mode: RestoreMode) -> Self {
        self.options.restore_mode = mode;
        self
    }

    pub fn transformer_name(&self) -> &str {
        self.transformer.name()
    }

    pub fn restore_mode(&self) -> RestoreMode {
        self.options.restore_mode
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.detector, self.transformer.as_ref(), self.options.clone())
    }

    /// Run one full redact -> transform -> restore cycle.
    pub fn process(&self, text: &str) -> anon_redact::Result<CycleOutcome> {
        self.pipeline().process(text)
    }

    /// Redact only; the returned store is the cycle's mapping.
    pub fn redact(&self, text: &str) -> anon_redact::Result<Redaction> {
        self.pipeline().redact(text)
    }
}

/// Construct the configured transformer.
pub fn build_transformer(config: &TransformerConfig) -> Result<Box<dyn Transformer>, RuntimeError> {
    match config.kind {
        TransformerKind::Echo => Ok(Box::new(EchoTransformer)),
        TransformerKind::Chat => build_chat(config),
    }
}

#[cfg(feature = "llm")]
fn build_chat(config: &TransformerConfig) -> Result<Box<dyn Transformer>, RuntimeError> {
    use anon_redact::{ChatTransformer, ChatTransformerConfig};
    use std::time::Duration;

    // An empty api_key_env means the endpoint takes no key.
    let api_key = if config.api_key_env.is_empty() {
        None
    } else {
        Some(
            std::env::var(&config.api_key_env).map_err(|_| RuntimeError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?,
        )
    };

    let mut chat = ChatTransformerConfig::new(&config.endpoint, &config.model);
    chat.api_key = api_key;
    chat.max_tokens = config.max_tokens;
    chat.timeout = Duration::from_secs(config.timeout_secs);
    if let Some(prompt) = &config.system_prompt {
        chat.system_prompt = prompt.clone();
    }

    Ok(Box::new(ChatTransformer::new(chat)))
}

#[cfg(not(feature = "llm"))]
fn build_chat(config: &TransformerConfig) -> Result<Box<dyn Transformer>, RuntimeError> {
    Err(RuntimeError::FeatureDisabled {
        kind: config.kind,
        feature: "llm",
    })
}
