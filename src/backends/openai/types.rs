use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Buffered reply from `POST /chat/completions`. Error replies reuse this
/// shape with an empty choice list and the envelope filled in.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ReplyMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
}

/// The hosted API's error envelope, `{"error": {"message": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
}

impl ChatResponse {
    /// Assistant text of the first choice, if the reply carries any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            temperature: 0.7,
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_chat_response_content() {
        let reply: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"git commit -m 'fix: y'"}}]}"#,
        )
        .unwrap();
        assert_eq!(reply.content(), Some("git commit -m 'fix: y'"));
    }

    #[test]
    fn test_chat_response_empty_content_treated_as_absent() {
        let reply: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#).unwrap();
        assert_eq!(reply.content(), None);

        let reply: ChatResponse = serde_json::from_str(r#"{"choices":[{"message":null}]}"#).unwrap();
        assert_eq!(reply.content(), None);
    }

    #[test]
    fn test_error_envelope_parses() {
        let reply: ChatResponse = serde_json::from_str(
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .unwrap();
        assert!(reply.choices.is_empty());
        assert_eq!(reply.error.unwrap().message, "Incorrect API key provided");
    }
}
