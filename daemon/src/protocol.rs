use serde::{Deserialize, Serialize};
use typeahead_core::ScoredEntry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRequest {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    Feed { ch: char },
    TypeText { text: String },
    Suggest(SuggestRequest),
    Reset,
    Stats,
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub prefix: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBody {
    Completions { completions: Vec<String> },
    Matches { matches: Vec<ScoredEntry> },
    Reset { discarded: String },
    Stats(StatsResponse),
    Pong,
    Error(ErrorResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub entries: usize,
    pub nodes: usize,
    pub session_id: u32,
    pub buffer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    SessionLimit,
    Internal,
}

impl DaemonResponse {
    pub fn error(id: String, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            id,
            body: ResponseBody::Error(ErrorResponse {
                code,
                message: message.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_feed_request() {
        let raw = r#"{"id":"abc","type":"feed","ch":"i"}"#;
        let request: DaemonRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.id, "abc");
        assert!(matches!(request.body, RequestBody::Feed { ch: 'i' }));
    }

    #[test]
    fn parse_suggest_without_limit() {
        let raw = r#"{"type":"suggest","prefix":"is"}"#;
        let request: DaemonRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.id, "");
        match request.body {
            RequestBody::Suggest(payload) => {
                assert_eq!(payload.prefix, "is");
                assert_eq!(payload.limit, None);
            }
            _ => panic!("expected suggest request"),
        }
    }

    #[test]
    fn feed_rejects_multi_char_payload() {
        let raw = r#"{"type":"feed","ch":"ab"}"#;
        assert!(serde_json::from_str::<DaemonRequest>(raw).is_err());
    }

    #[test]
    fn completions_response_shape() {
        let response = DaemonResponse {
            id: "7".to_string(),
            body: ResponseBody::Completions {
                completions: vec!["island".to_string()],
            },
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "7", "type": "completions", "completions": ["island"]})
        );
    }

    #[test]
    fn error_response_shape() {
        let response = DaemonResponse::error(String::new(), ErrorCode::SessionLimit, "full");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "session_limit");
        assert_eq!(value["message"], "full");
    }
}
