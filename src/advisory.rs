// src/advisory.rs

use crate::allocation::AllocationResult;
use crate::config::{LlmBackend, LlmSection};
use crate::error::AdvisoryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, warn};

const PROMPT_TEMPLATE: &str = "You are a retail inventory management expert. \
Analyze the following allocation data for {store} store:
- Maximum capacity: {capacity} pieces
- Currently allocated: {allocated} pieces ({percentage}% of capacity)

Provide 3 concise bullet points of insights or recommendations to optimize this jacket allocation.
Focus on inventory turnover, store-specific strategy, and efficiency.";

/// The figures the advisor is asked about.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryContext {
    pub store: String,
    pub capacity: u32,
    pub allocated: u32,
    pub percentage: f64,
}

impl From<&AllocationResult> for AdvisoryContext {
    fn from(result: &AllocationResult) -> Self {
        Self {
            store: result.store.clone(),
            capacity: result.max_capacity,
            allocated: result.total_allocated,
            percentage: result.capacity_percentage,
        }
    }
}

pub fn render_prompt(ctx: &AdvisoryContext) -> String {
    PROMPT_TEMPLATE
        .replace("{store}", &ctx.store)
        .replace("{capacity}", &ctx.capacity.to_string())
        .replace("{allocated}", &ctx.allocated.to_string())
        .replace("{percentage}", &format!("{:.1}", ctx.percentage))
}

/// Something that turns allocation figures into freeform advice.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, ctx: &AdvisoryContext) -> Result<String, AdvisoryError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat-completion client.
#[derive(Debug, Clone)]
pub struct ChatAdvisor {
    client: Client,
    backend: LlmBackend,
    base_url: String,
    model: String,
    api_key: String,
}

impl ChatAdvisor {
    /// Resolve the configured backend into a concrete endpoint. `api_key` is
    /// only consulted for the remote backend.
    pub fn from_config(llm: &LlmSection, api_key: Option<String>) -> Result<Self, AdvisoryError> {
        let (endpoint, api_key) = match llm.backend {
            LlmBackend::Disabled => return Err(AdvisoryError::Disabled),
            // Local endpoints accept any bearer token.
            LlmBackend::Ollama => (&llm.ollama, "ollama".to_string()),
            LlmBackend::Cliproxy => (&llm.cliproxy, "cliproxy".to_string()),
            LlmBackend::Remote => {
                let key = api_key
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| AdvisoryError::MissingApiKey(llm.api_key_env.clone()))?;
                (&llm.remote, key)
            }
        };
        info!(
            backend = ?llm.backend,
            url = %endpoint.base_url,
            model = %endpoint.model,
            "Advisory backend resolved"
        );
        Ok(Self {
            client: Client::new(),
            backend: llm.backend,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
            api_key,
        })
    }

    /// Ollama answers on its root URL, not under `/v1`.
    async fn ollama_reachable(&self) -> bool {
        let health_url = self.base_url.trim_end_matches("/v1");
        match self
            .client
            .get(health_url)
            .timeout(std::time::Duration::from_secs(3))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!(status = %resp.status(), "Ollama server returned non-OK status");
                false
            }
            Err(e) => {
                warn!(error = %e, "Ollama server not reachable");
                false
            }
        }
    }
}

#[async_trait]
impl Advisor for ChatAdvisor {
    async fn advise(&self, ctx: &AdvisoryContext) -> Result<String, AdvisoryError> {
        if self.backend == LlmBackend::Ollama && !self.ollama_reachable().await {
            return Err(AdvisoryError::Unreachable(self.base_url.clone()));
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: render_prompt(ctx),
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AdvisoryError::EmptyResponse)
    }
}

/// Ask for advice; any failure is logged and becomes `Err(message)` for the
/// caller to show in place of the advice. Never aborts the allocation.
pub async fn advise_or_report(advisor: &dyn Advisor, result: &AllocationResult) -> Result<String, String> {
    let ctx = AdvisoryContext::from(result);
    let span = tracing::info_span!("advisory", store = %ctx.store);

    match advisor.advise(&ctx).instrument(span).await {
        Ok(text) => {
            info!(chars = text.len(), "Advisory received");
            Ok(text)
        }
        Err(e) => {
            warn!(error = %e, "Advisory unavailable");
            Err(format!("Advisory unavailable: {e}"))
        }
    }
}

/// Resolve the configured backend and ask it about `result`. A disabled or
/// misconfigured backend is reported the same way as a failed call.
pub async fn advise_from_config(
    llm: &LlmSection,
    api_key: Option<String>,
    result: &AllocationResult,
) -> Result<String, String> {
    match ChatAdvisor::from_config(llm, api_key) {
        Ok(advisor) => advise_or_report(&advisor, result).await,
        Err(AdvisoryError::Disabled) => Err(
            "Advisory disabled. Set `backend` under [llm] in the config to get AI-powered allocation insights."
                .to_string(),
        ),
        Err(e) => {
            warn!(error = %e, store = %result.store, "Advisory unavailable");
            Err(format!("Advisory unavailable: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedAdvisor {
        answer: Result<String, ()>,
        seen: Mutex<Vec<AdvisoryContext>>,
    }

    #[async_trait]
    impl Advisor for FixedAdvisor {
        async fn advise(&self, ctx: &AdvisoryContext) -> Result<String, AdvisoryError> {
            self.seen.lock().unwrap().push(ctx.clone());
            self.answer.clone().map_err(|_| AdvisoryError::EmptyResponse)
        }
    }

    fn result() -> AllocationResult {
        AllocationResult {
            store: "DUKE RO".into(),
            max_capacity: 3,
            allocation: Vec::new(),
            total_allocated: 1,
            capacity_percentage: 33.3,
            available_articles_count: 1,
        }
    }

    #[test]
    fn test_render_prompt() {
        let prompt = render_prompt(&AdvisoryContext::from(&result()));
        assert!(prompt.contains("allocation data for DUKE RO store"));
        assert!(prompt.contains("- Maximum capacity: 3 pieces"));
        assert!(prompt.contains("- Currently allocated: 1 pieces (33.3% of capacity)"));
        assert!(prompt.contains("3 concise bullet points"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_backend_resolution() {
        let mut llm = LlmSection::default();
        assert!(matches!(ChatAdvisor::from_config(&llm, None), Err(AdvisoryError::Disabled)));

        llm.backend = LlmBackend::Remote;
        let err = ChatAdvisor::from_config(&llm, Some("  ".into())).unwrap_err();
        assert!(matches!(err, AdvisoryError::MissingApiKey(ref var) if var == "LLM_API_KEY"));
        assert_eq!(err.to_string(), "LLM_API_KEY env var required for remote backend");

        llm.remote.base_url = "https://example.test/v1/".into();
        let advisor = ChatAdvisor::from_config(&llm, Some("sk-test".into())).unwrap();
        assert_eq!(advisor.base_url, "https://example.test/v1");
        assert_eq!(advisor.model, "gpt-4o-mini");

        llm.backend = LlmBackend::Ollama;
        let advisor = ChatAdvisor::from_config(&llm, None).unwrap();
        assert_eq!(advisor.model, "qwen3:8b");
    }

    #[tokio::test]
    async fn test_advice_passed_through() {
        let advisor = FixedAdvisor {
            answer: Ok("- Rotate slow movers".into()),
            seen: Mutex::new(Vec::new()),
        };
        let advice = advise_or_report(&advisor, &result()).await;
        assert_eq!(advice, Ok("- Rotate slow movers".to_string()));
        assert_eq!(advisor.seen.lock().unwrap()[0].allocated, 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_fatal() {
        let advisor = FixedAdvisor {
            answer: Err(()),
            seen: Mutex::new(Vec::new()),
        };
        let message = advise_or_report(&advisor, &result()).await.unwrap_err();
        assert!(message.starts_with("Advisory unavailable"));
    }

    #[tokio::test]
    async fn test_disabled_and_missing_key_reported() {
        let mut llm = LlmSection::default();
        let message = advise_from_config(&llm, None, &result()).await.unwrap_err();
        assert!(message.starts_with("Advisory disabled"));

        llm.backend = LlmBackend::Remote;
        let message = advise_from_config(&llm, None, &result()).await.unwrap_err();
        assert_eq!(message, "Advisory unavailable: LLM_API_KEY env var required for remote backend");
    }

    #[tokio::test]
    async fn test_unreachable_ollama() {
        let mut llm = LlmSection::default();
        llm.backend = LlmBackend::Ollama;
        // Port 9 (discard) on localhost is closed on test machines.
        llm.ollama.base_url = "http://127.0.0.1:9/v1".into();
        let advisor = ChatAdvisor::from_config(&llm, None).unwrap();
        let err = advisor.advise(&AdvisoryContext::from(&result())).await.unwrap_err();
        assert!(matches!(err, AdvisoryError::Unreachable(ref url) if url == "http://127.0.0.1:9/v1"));
    }
}
