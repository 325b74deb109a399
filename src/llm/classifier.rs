// src/llm/classifier.rs
//
// Classificador de transcripts via chat-completion. Amostragem
// determinística (temperature 0) e saída JSON estrita. Falha de parse
// NÃO é fatal para o pipeline: devolvemos `analysis = None` e o texto
// bruto fica guardado para triagem manual.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LlmError;
use crate::models::calls::CallAnalysis;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = r#"You analyze hotel voice-call transcripts. Reply with STRICT JSON only, no prose, matching exactly:
{
  "summary": "<2-3 sentence summary of the call>",
  "intent": "queries" | "booked" | "interested" | "not_interested" | "follow_up",
  "booking": {
    "is_booked": true | false,
    "date": "<YYYY-MM-DD or null>",
    "time": "<HH:MM or null>",
    "raw_datetime_string": "<the literal words used for the date/time, or null>"
  },
  "contact_name": "<caller name or null>",
  "call_direction": "inbound" | "outbound"
}
Use "booked" only when the caller explicitly confirmed a reservation."#;

/// Provedor selecionado por configuração explícita (`LLM_PROVIDER`).
/// O sniffing de prefixo da chave existe só como fallback de migração.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Groq,
}

impl LlmProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "groq" => Some(Self::Groq),
            _ => None,
        }
    }

    /// Fallback documentado: deduz o provedor pelo prefixo da chave.
    pub fn sniff_from_key(api_key: &str) -> Option<Self> {
        if api_key.starts_with("gsk_") {
            Some(Self::Groq)
        } else if api_key.starts_with("sk-") {
            Some(Self::OpenAi)
        } else {
            None
        }
    }

    fn endpoint(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Groq => "llama-3.3-70b-versatile",
        }
    }
}

#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    /// Valor de `LLM_PROVIDER`, quando definido.
    pub provider: Option<LlmProvider>,
}

impl LlmConfig {
    /// Provedor efetivo: configuração explícita > prefixo da chave > OpenAI.
    pub fn resolve_provider(&self) -> LlmProvider {
        self.provider
            .or_else(|| LlmProvider::sniff_from_key(&self.api_key))
            .unwrap_or(LlmProvider::OpenAi)
    }
}

/// Resultado de uma classificação: o veredito estruturado (quando o
/// modelo respondeu JSON válido) e sempre o texto bruto.
#[derive(Debug)]
pub struct Classification {
    pub analysis: Option<CallAnalysis>,
    pub raw_text: String,
}

#[derive(Clone)]
pub struct CallClassifier {
    client: Client,
    config: LlmConfig,
}

impl CallClassifier {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub async fn classify(&self, transcript: &str) -> Result<Classification, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let provider = self.config.resolve_provider();
        let request = ChatRequest {
            model: provider.default_model(),
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: transcript.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(provider.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|_| LlmError::Api {
                status: status.as_u16(),
                body: body.clone(),
            })?;

        let raw_text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(Classification {
            analysis: parse_analysis(&raw_text),
            raw_text,
        })
    }
}

/// Desserializa o veredito, tolerando cercas de código markdown em volta.
pub fn parse_analysis(raw: &str) -> Option<CallAnalysis> {
    serde_json::from_str(strip_code_fence(raw)).ok()
}

/// Modelos adoram embrulhar JSON em ```json ... ``` mesmo quando pedimos
/// saída estrita; removemos a cerca antes do parse.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Pula o identificador de linguagem ("json") na primeira linha.
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// --- Formato OpenAI-compatível (Groq usa o mesmo) ---

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::calls::CallIntent;

    const VALID: &str = r#"{
        "summary": "Caller confirmed a deluxe room for two nights.",
        "intent": "booked",
        "booking": {
            "is_booked": true,
            "date": "2026-09-03",
            "time": "14:00",
            "raw_datetime_string": "next Thursday at 2pm"
        },
        "contact_name": "Ravi",
        "call_direction": "inbound"
    }"#;

    #[test]
    fn parse_de_veredito_valido() {
        let analysis = parse_analysis(VALID).unwrap();
        assert_eq!(analysis.intent, CallIntent::Booked);
        assert!(analysis.booking.is_booked);
        assert_eq!(analysis.booking.date.as_deref(), Some("2026-09-03"));
        assert_eq!(analysis.contact_name.as_deref(), Some("Ravi"));
    }

    #[test]
    fn parse_remove_cerca_de_codigo() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(parse_analysis(&fenced).is_some());

        let fenced_sem_linguagem = format!("```\n{}\n```", VALID);
        assert!(parse_analysis(&fenced_sem_linguagem).is_some());
    }

    #[test]
    fn resposta_nao_json_vira_none() {
        assert!(parse_analysis("I'm sorry, I cannot classify this call.").is_none());
        assert!(parse_analysis("").is_none());
        // JSON válido mas com shape errado também é rejeitado.
        assert!(parse_analysis(r#"{"foo": 1}"#).is_none());
    }

    #[test]
    fn intent_desconhecido_e_rejeitado() {
        let raw = VALID.replace("\"booked\"", "\"maybe_later\"");
        assert!(parse_analysis(&raw).is_none());
    }

    #[test]
    fn selecao_de_provedor() {
        // Configuração explícita vence.
        let config = LlmConfig {
            api_key: "gsk_abc".to_string(),
            provider: Some(LlmProvider::OpenAi),
        };
        assert_eq!(config.resolve_provider(), LlmProvider::OpenAi);

        // Sem configuração, o prefixo decide.
        let config = LlmConfig {
            api_key: "gsk_abc".to_string(),
            provider: None,
        };
        assert_eq!(config.resolve_provider(), LlmProvider::Groq);

        let config = LlmConfig {
            api_key: "sk-abc".to_string(),
            provider: None,
        };
        assert_eq!(config.resolve_provider(), LlmProvider::OpenAi);

        // Prefixo desconhecido: cai no provedor padrão.
        let config = LlmConfig {
            api_key: "chave-opaca".to_string(),
            provider: None,
        };
        assert_eq!(config.resolve_provider(), LlmProvider::OpenAi);
    }
}
