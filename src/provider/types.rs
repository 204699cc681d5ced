use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("unknown provider `{0}`")]
    UnknownProvider(String),
    #[error("no provider serves model `{0}`")]
    UnknownModel(String),
    #[error("authentication failed for {provider}: {reason}")]
    Authentication {
        provider: ProviderKind,
        reason: String,
    },
    #[error("{provider} throttled the request: {reason}")]
    RateLimited {
        provider: ProviderKind,
        reason: String,
    },
    #[error("transport failure calling {provider}: {reason}")]
    Transport {
        provider: ProviderKind,
        reason: String,
    },
    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse {
        provider: ProviderKind,
        reason: String,
    },
}

impl ProviderError {
    /// A schema-shaped or transport failure can be retried with the same
    /// request; authentication and configuration problems cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Transport { .. } | ProviderError::MalformedResponse { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Closed model-name mapping. Adding a backend means adding a case here,
    /// not registering a runtime hook.
    pub fn for_model(model: &str) -> Result<Self, ProviderError> {
        let normalized = model.trim().to_ascii_lowercase();
        if normalized.starts_with("gpt") || normalized.starts_with("o1") {
            return Ok(Self::OpenAi);
        }
        if normalized.starts_with("claude") {
            return Ok(Self::Anthropic);
        }
        if normalized.starts_with("gemini") {
            return Ok(Self::Gemini);
        }
        Err(ProviderError::UnknownModel(model.to_string()))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ProviderKind {
    type Error = ProviderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }
}

/// One outbound generation request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// When set, the caller expects a JSON object and the response carries the
    /// parsed mapping alongside the raw text.
    pub structured: bool,
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 4000,
            structured: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn structured(mut self) -> Self {
        self.structured = true;
        self
    }
}

/// Normalized provider result.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub structured: Option<Map<String, Value>>,
    pub model: String,
    pub tokens_used: Option<u64>,
}

/// Seam between the step runner and the outbound transports. Production code
/// uses `ProviderClient`; tests substitute a scripted generator.
pub trait TextGenerator {
    fn generate(
        &self,
        request: &ProviderRequest,
        provider: ProviderKind,
    ) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_prefixes_map_to_closed_provider_set() {
        assert_eq!(
            ProviderKind::for_model("gpt-4").expect("gpt"),
            ProviderKind::OpenAi
        );
        assert_eq!(
            ProviderKind::for_model("claude-3-5-sonnet-20240620").expect("claude"),
            ProviderKind::Anthropic
        );
        assert_eq!(
            ProviderKind::for_model("Gemini-1.5-Pro").expect("gemini"),
            ProviderKind::Gemini
        );
        assert!(matches!(
            ProviderKind::for_model("llama-3"),
            Err(ProviderError::UnknownModel(_))
        ));
    }

    #[test]
    fn provider_names_round_trip() {
        for kind in [
            ProviderKind::OpenAi,
            ProviderKind::Anthropic,
            ProviderKind::Gemini,
        ] {
            assert_eq!(ProviderKind::try_from(kind.as_str()).expect("parse"), kind);
        }
        assert!(matches!(
            ProviderKind::try_from("cohere"),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn retryability_follows_the_error_category() {
        let transport = ProviderError::Transport {
            provider: ProviderKind::OpenAi,
            reason: "timed out".to_string(),
        };
        let auth = ProviderError::Authentication {
            provider: ProviderKind::OpenAi,
            reason: "bad key".to_string(),
        };
        assert!(transport.is_retryable());
        assert!(!auth.is_retryable());
    }
}
