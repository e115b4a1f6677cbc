//! The external transformation step.
//!
//! The pipeline hands redacted text to a [`Transformer`] and restores whatever
//! comes back. Placeholders must survive the round trip verbatim to be restored.

use crate::Result;

/// Opaque `text -> text` step between redaction and restoration.
pub trait Transformer: Send + Sync {
    fn transform(&self, text: &str) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> Transformer for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn transform(&self, text: &str) -> Result<String> {
        self(text)
    }
}

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTransformer;

impl Transformer for EchoTransformer {
    fn transform(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Default instruction sent ahead of the redacted text.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Some values in the user's text have been replaced with \
placeholder tokens of the form <TYPE_N>, for example <PERSON_0> or <SORTCODE_1>. Copy every \
placeholder you use exactly as written, including the angle brackets, and never invent new ones.";

#[cfg(feature = "llm")]
pub use chat::{ChatTransformer, ChatTransformerConfig};

#[cfg(feature = "llm")]
mod chat {
    use super::{Transformer, DEFAULT_SYSTEM_PROMPT};
    use crate::{RedactionError, Result};
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tracing::debug;

    /// Settings for an OpenAI-compatible chat-completions endpoint.
    #[derive(Debug, Clone)]
    pub struct ChatTransformerConfig {
        /// Full URL of the chat-completions endpoint.
        pub endpoint: String,
        pub model: String,
        pub api_key: Option<String>,
        pub max_tokens: u32,
        pub timeout: Duration,
        pub system_prompt: String,
    }

    impl ChatTransformerConfig {
        pub fn new(endpoint: &str, model: &str) -> Self {
            Self {
                endpoint: endpoint.to_string(),
                model: model.to_string(),
                api_key: None,
                max_tokens: 512,
                timeout: Duration::from_secs(30),
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            }
        }
    }

    #[derive(Serialize)]
    struct ChatRequest<'a> {
        model: &'a str,
        max_tokens: u32,
        messages: [ChatMessageOut<'a>; 2],
    }

    #[derive(Serialize)]
    struct ChatMessageOut<'a> {
        role: &'static str,
        content: &'a str,
    }

    #[derive(Deserialize)]
    struct ChatResponse {
        choices: Vec<ChatChoice>,
    }

    #[derive(Deserialize)]
    struct ChatChoice {
        message: ChatMessageIn,
    }

    #[derive(Deserialize)]
    struct ChatMessageIn {
        content: Option<String>,
    }

    /// Sends redacted text to a chat-completions API.
    pub struct ChatTransformer {
        config: ChatTransformerConfig,
        agent: ureq::Agent,
    }

    impl ChatTransformer {
        pub fn new(config: ChatTransformerConfig) -> Self {
            let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
            Self { config, agent }
        }

        fn map_error(&self, err: ureq::Error) -> RedactionError {
            match err {
                ureq::Error::Status(code, _) => {
                    RedactionError::Transform(format!("endpoint returned HTTP {}", code))
                }
                ureq::Error::Transport(t) => {
                    let timed_out = std::error::Error::source(&t)
                        .and_then(|s| s.downcast_ref::<std::io::Error>())
                        .map(|io| {
                            matches!(
                                io.kind(),
                                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                            )
                        })
                        .unwrap_or(false);
                    if timed_out {
                        RedactionError::Timeout {
                            secs: self.config.timeout.as_secs(),
                        }
                    } else {
                        RedactionError::Transform(t.to_string())
                    }
                }
            }
        }
    }

    impl Transformer for ChatTransformer {
        fn transform(&self, text: &str) -> Result<String> {
            let body = ChatRequest {
                model: &self.config.model,
                max_tokens: self.config.max_tokens,
                messages: [
                    ChatMessageOut {
                        role: "system",
                        content: &self.config.system_prompt,
                    },
                    ChatMessageOut {
                        role: "user",
                        content: text,
                    },
                ],
            };

            let mut request = self.agent.post(&self.config.endpoint);
            if let Some(key) = &self.config.api_key {
                request = request.set("Authorization", &format!("Bearer {}", key));
            }

            debug!(model = %self.config.model, chars = text.len(), "sending chat request");
            let response = request.send_json(&body).map_err(|e| self.map_error(e))?;
            let parsed: ChatResponse = response
                .into_json()
                .map_err(|e| RedactionError::Transform(format!("malformed response: {}", e)))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| RedactionError::Transform("response had no choices".to_string()))
        }

        fn name(&self) -> &str {
            "chat"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RedactionError;

    #[test]
    fn test_echo_is_identity() {
        let t = EchoTransformer;
        assert_eq!(t.transform("<PERSON_0> said hi").unwrap(), "<PERSON_0> said hi");
        assert_eq!(t.name(), "echo");
    }

    #[test]
    fn test_closure_transformer() {
        let upper = |s: &str| -> Result<String> { Ok(s.replace("hi", "hello")) };
        assert_eq!(upper.transform("hi <A_0>").unwrap(), "hello <A_0>");

        let failing = |_: &str| -> Result<String> { Err(RedactionError::Transform("down".into())) };
        assert!(failing.transform("x").is_err());
    }

    #[test]
    fn test_system_prompt_mentions_format() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("<PERSON_0>"));
    }
}
