use crate::domain::error::DomainError;
use crate::domain::ports::intent_parser::{IntentParser, ParsedIntent};
use reqwest::Client;
use serde::Serialize;

/// JSON-over-HTTP client for the external intent extraction service. The
/// service is a black box; its response deserializes straight into
/// `ParsedIntent`.
pub struct RemoteIntentParser {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct IntentRequest<'a> {
    query: &'a str,
}

impl RemoteIntentParser {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl IntentParser for RemoteIntentParser {
    async fn parse(&self, query: &str) -> Result<ParsedIntent, DomainError> {
        let mut request = self.client.post(&self.endpoint).json(&IntentRequest { query });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| DomainError::Intent(format!("intent service error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Intent(format!("intent service {status}: {body}")));
        }

        resp.json::<ParsedIntent>()
            .await
            .map_err(|e| DomainError::Parse(format!("intent response: {e}")))
    }
}
