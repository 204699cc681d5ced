use crate::config::ProviderCredentials;
use crate::provider::output_parse::extract_structured_object;
use crate::provider::{ProviderError, ProviderKind, ProviderRequest, ProviderResponse, TextGenerator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Blocking HTTP adapter over the three text-generation backends. Stateless
/// across calls beyond the shared agent; one attempt per call, no retries.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    agent: ureq::Agent,
    credentials: ProviderCredentials,
    openai_api_base: String,
    anthropic_api_base: String,
    gemini_api_base: String,
}

fn api_base(env_name: &str, default: &str) -> String {
    std::env::var(env_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl ProviderClient {
    pub fn new(credentials: ProviderCredentials, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            credentials,
            openai_api_base: api_base("PAGEFORGE_OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
            anthropic_api_base: api_base("PAGEFORGE_ANTHROPIC_API_BASE", DEFAULT_ANTHROPIC_API_BASE),
            gemini_api_base: api_base("PAGEFORGE_GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
        }
    }

    fn credential_for(&self, provider: ProviderKind) -> Result<&str, ProviderError> {
        let key = match provider {
            ProviderKind::OpenAi => self.credentials.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.credentials.anthropic_api_key.as_deref(),
            ProviderKind::Gemini => self.credentials.gemini_api_key.as_deref(),
        };
        key.filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ProviderError::Authentication {
                provider,
                reason: "no API key configured".to_string(),
            })
    }

    fn generate_openai(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let provider = ProviderKind::OpenAi;
        let key = self.credential_for(provider)?;
        let url = format!("{}/chat/completions", self.openai_api_base.trim_end_matches('/'));
        let body = OpenAiRequest {
            model: &request.model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {key}"))
            .send_json(
                serde_json::to_value(&body).map_err(|err| ProviderError::Transport {
                    provider,
                    reason: format!("failed to encode request body: {err}"),
                })?,
            )
            .map_err(|err| classify_call_error(provider, err))?;

        let parsed: OpenAiResponse = response
            .into_json()
            .map_err(|err| ProviderError::MalformedResponse {
                provider,
                reason: format!("invalid response body: {err}"),
            })?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider,
                reason: "response carried no message content".to_string(),
            })?;
        Ok(ProviderResponse {
            text,
            structured: None,
            model: request.model.clone(),
            tokens_used: parsed.usage.map(|usage| usage.total_tokens),
        })
    }

    fn generate_anthropic(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let provider = ProviderKind::Anthropic;
        let key = self.credential_for(provider)?;
        let url = format!("{}/v1/messages", self.anthropic_api_base.trim_end_matches('/'));
        let body = AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .agent
            .post(&url)
            .set("x-api-key", key)
            .set("anthropic-version", ANTHROPIC_VERSION)
            .send_json(
                serde_json::to_value(&body).map_err(|err| ProviderError::Transport {
                    provider,
                    reason: format!("failed to encode request body: {err}"),
                })?,
            )
            .map_err(|err| classify_call_error(provider, err))?;

        let parsed: AnthropicResponse =
            response
                .into_json()
                .map_err(|err| ProviderError::MalformedResponse {
                    provider,
                    reason: format!("invalid response body: {err}"),
                })?;
        let text = parsed
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(ProviderError::MalformedResponse {
                provider,
                reason: "response carried no text blocks".to_string(),
            });
        }
        let tokens_used = parsed
            .usage
            .map(|usage| usage.input_tokens + usage.output_tokens);
        Ok(ProviderResponse {
            text,
            structured: None,
            model: request.model.clone(),
            tokens_used,
        })
    }

    fn generate_gemini(&self, request: &ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let provider = ProviderKind::Gemini;
        let key = self.credential_for(provider)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.gemini_api_base.trim_end_matches('/'),
            request.model,
            urlencoding::encode(key)
        );
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let response = self
            .agent
            .post(&url)
            .send_json(
                serde_json::to_value(&body).map_err(|err| ProviderError::Transport {
                    provider,
                    reason: format!("failed to encode request body: {err}"),
                })?,
            )
            .map_err(|err| classify_call_error(provider, err))?;

        let parsed: GeminiResponse =
            response
                .into_json()
                .map_err(|err| ProviderError::MalformedResponse {
                    provider,
                    reason: format!("invalid response body: {err}"),
                })?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider,
                reason: "response carried no candidates".to_string(),
            })?;
        let tokens_used = parsed
            .usage_metadata
            .map(|metadata| metadata.total_token_count);
        Ok(ProviderResponse {
            text,
            structured: None,
            model: request.model.clone(),
            tokens_used,
        })
    }
}

impl TextGenerator for ProviderClient {
    fn generate(
        &self,
        request: &ProviderRequest,
        provider: ProviderKind,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut response = match provider {
            ProviderKind::OpenAi => self.generate_openai(request)?,
            ProviderKind::Anthropic => self.generate_anthropic(request)?,
            ProviderKind::Gemini => self.generate_gemini(request)?,
        };
        if request.structured {
            response.structured = Some(extract_structured_object(&response.text, provider)?);
        }
        Ok(response)
    }
}

/// Map HTTP-level failures onto the caller-facing taxonomy so the workflow
/// driver can pick between retry, provider switch, and surfacing to the user.
pub(crate) fn classify_status(provider: ProviderKind, status: u16, body: &str) -> ProviderError {
    let reason = if body.trim().is_empty() {
        format!("http status {status}")
    } else {
        format!("http status {status}: {}", truncate(body, 200))
    };
    match status {
        401 | 403 => ProviderError::Authentication { provider, reason },
        429 => ProviderError::RateLimited { provider, reason },
        _ => ProviderError::Transport { provider, reason },
    }
}

fn classify_call_error(provider: ProviderKind, err: ureq::Error) -> ProviderError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            classify_status(provider, status, &body)
        }
        ureq::Error::Transport(transport) => ProviderError::Transport {
            provider,
            reason: transport.to_string(),
        },
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    total_tokens: u64,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: u64,
}
