use mindmenders_core::{ChatRole, HistoryTurn};
use serde_json::{json, Value};

use crate::error::ConversionError;
use crate::persona::{SYSTEM_INSTRUCTION, TEMPERATURE, TOP_P};
use crate::transformer::SchemaTransformer;

/// Transformer for the Gemini `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiTransformer {
    system_instruction: String,
    temperature: f64,
    top_p: f64,
}

impl GeminiTransformer {
    pub fn new() -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }

    /// Gemini only knows "user" and "model" authors
    fn role_name(role: ChatRole) -> &'static str {
        match role {
            ChatRole::Ai => "model",
            ChatRole::User => "user",
        }
    }

    fn content(role: &str, text: &str) -> Value {
        json!({
            "role": role,
            "parts": [{ "text": text }],
        })
    }
}

impl Default for GeminiTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaTransformer for GeminiTransformer {
    fn endpoint(&self, base_url: &str, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    fn transform_request(&self, history: &[HistoryTurn], prompt: &str) -> Result<Value, ConversionError> {
        let mut contents: Vec<Value> = history
            .iter()
            .map(|turn| Self::content(Self::role_name(turn.role), &turn.content))
            .collect();
        contents.push(Self::content("user", prompt));

        Ok(json!({
            "contents": contents,
            "systemInstruction": {
                "parts": [{ "text": self.system_instruction }],
            },
            "generationConfig": {
                "temperature": self.temperature,
                "topP": self.top_p,
            },
        }))
    }

    fn parse_response(&self, data: &Value) -> Result<String, ConversionError> {
        let candidate = match data.get("candidates").and_then(|c| c.get(0)) {
            Some(candidate) => candidate,
            None => {
                if let Some(reason) = data.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
                    return Err(ConversionError::InvalidFormat(format!("prompt blocked: {}", reason)));
                }
                return Err(ConversionError::MissingField("candidates".to_string()));
            }
        };

        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| ConversionError::MissingField("candidates[0].content.parts".to_string()))?;

        Ok(parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect())
    }

    fn parse_error(&self, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| value.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_request_maps_roles() {
        let transformer = GeminiTransformer::new();
        let history = vec![
            HistoryTurn::user("I can't sleep"),
            HistoryTurn::ai("That sounds exhausting."),
        ];

        let body = transformer.transform_request(&history, "Any tips?").unwrap();
        let contents = body["contents"].as_array().unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "That sounds exhausting.");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "Any tips?");
    }

    #[test]
    fn test_transform_request_fixed_parameters() {
        let body = GeminiTransformer::new().transform_request(&[], "hi").unwrap();

        assert_eq!(body["generationConfig"]["temperature"], 0.7);
        assert_eq!(body["generationConfig"]["topP"], 0.95);
        let instruction = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(instruction.starts_with("You are MindMenders AI"));
        assert!(instruction.contains("988"));
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let data = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Let's breathe " }, { "text": "together." }]
                },
                "finishReason": "STOP"
            }]
        });

        let text = GeminiTransformer::new().parse_response(&data).unwrap();
        assert_eq!(text, "Let's breathe together.");
    }

    #[test]
    fn test_parse_response_errors() {
        let transformer = GeminiTransformer::new();

        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(
            transformer.parse_response(&blocked),
            Err(ConversionError::InvalidFormat(msg)) if msg.contains("SAFETY")
        ));

        let empty = json!({ "candidates": [] });
        assert!(matches!(
            transformer.parse_response(&empty),
            Err(ConversionError::MissingField(_))
        ));
    }

    #[test]
    fn test_endpoint_and_error_message() {
        let transformer = GeminiTransformer::new();
        assert_eq!(
            transformer.endpoint("https://example.com/", "gemini-x"),
            "https://example.com/v1beta/models/gemini-x:generateContent"
        );

        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(transformer.parse_error(body), "API key not valid");
        assert_eq!(transformer.parse_error("plain"), "plain");
    }
}
