pub mod gemini;

pub use gemini::GeminiTransformer;

use mindmenders_core::HistoryTurn;
use serde_json::Value;

use crate::error::ConversionError;

/// Schema transformer trait for converting between internal and provider formats
pub trait SchemaTransformer: Send + Sync {
    /// Full URL of the completion endpoint
    fn endpoint(&self, base_url: &str, model: &str) -> String;

    /// Transform history and prompt to provider-specific request body
    fn transform_request(&self, history: &[HistoryTurn], prompt: &str) -> Result<Value, ConversionError>;

    /// Extract the reply text from a complete response
    fn parse_response(&self, data: &Value) -> Result<String, ConversionError>;

    /// Extract a readable message from an error response body
    fn parse_error(&self, body: &str) -> String {
        body.to_string()
    }
}
