use crate::domain::error::DomainError;
use crate::domain::ports::intent_parser::{IntentParser, ParsedIntent};

/// Empty intent: the orchestrator then relies purely on explicit filters
/// and heuristic retrieval. Used offline and in tests.
pub struct NoopIntentParser;

#[async_trait::async_trait]
impl IntentParser for NoopIntentParser {
    async fn parse(&self, _query: &str) -> Result<ParsedIntent, DomainError> {
        Ok(ParsedIntent::default())
    }
}
