use async_trait::async_trait;
use log::info;
use serde::{ Deserialize, Serialize };

use super::{ http_stream_generate, BoxError, ChatBackend, FragmentStream };
use crate::cli::Args;
use crate::llm::SamplingConfig;
use crate::models::chat::{ ChatMessage, Role };

const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Serialize)]
struct GeminiStreamRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
}

#[derive(Deserialize)]
struct GoogleChunk {
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Deserialize)]
struct GoogleContent {
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: String,
}

/// The streaming endpoint replies with a JSON array spread across the body;
/// each useful line carries one chunk object.
fn parse_gemini_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line == "[" || line == "]" || line == "," {
        return None;
    }

    if line.starts_with('{') {
        let json_obj = if line.ends_with('}') {
            line.to_string()
        } else if line.ends_with("},") {
            line[..line.len() - 1].to_string()
        } else {
            return None;
        };

        return serde_json
            ::from_str::<GoogleChunk>(&json_obj)
            .ok()
            .and_then(|gc| {
                gc.candidates.first().and_then(|c| { c.content.parts.first().map(|p| p.text.clone()) })
            });
    }

    if line.contains("\"text\":") {
        if let Some(start) = line.find(':') {
            let value_part = line[start + 1..].trim();
            if value_part.starts_with('"') {
                let first_quote = value_part.find('"')?;
                let last_quote = value_part.rfind('"')?;
                if last_quote > first_quote {
                    return Some(value_part[first_quote + 1..last_quote].to_string());
                }
            }
        }
    }

    None
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Result<Self, BoxError> {
        if api_key.is_empty() {
            return Err("Google API key is required for GeminiBackend".into());
        }
        Ok(Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn from_args(args: &Args) -> Result<Self, BoxError> {
        let api_key = if args.api_key.is_empty() { None } else { Some(args.api_key.clone()) };
        Self::new(
            api_key.ok_or("Google API key is required for GeminiBackend (set GEMINI_API_KEY)")?,
            args.chat_model.clone(),
            args.chat_base_url.clone()
        )
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn send_stream(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
        sampling: &SamplingConfig
    ) -> Result<FragmentStream, BoxError> {
        info!("GeminiBackend::send_stream() → model={} turns={}", self.model, history.len());

        let contents = history
            .iter()
            .map(|msg| GeminiContent {
                role: Some(role_name(msg.role)),
                parts: vec![GeminiPart { text: msg.text.clone() }],
            })
            .collect();

        let payload = GeminiStreamRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_instruction.to_string() }],
            },
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                top_k: sampling.top_k,
            },
        };

        let model_endpoint = format!("{}/{}", self.base_url.trim_end_matches('/'), self.model);
        let route_suffix = format!(":streamGenerateContent?key={}", self.api_key);

        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        http_stream_generate(model_endpoint, &route_suffix, payload, parse_gemini_line, Some(headers)).await
    }
}
