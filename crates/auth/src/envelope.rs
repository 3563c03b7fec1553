//! The `{ data, error, status, message }` envelope every backend response uses

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw response envelope as the backend sends it
///
/// Any field may be missing. Use [`ApiResponse::into_result`] to turn it into
/// a strict success/failure value instead of inspecting the fields directly.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Error payload; the backend sends either a bare string or an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorInfo {
    Text(String),
    Detailed {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<Value>,
        #[serde(default)]
        name: Option<String>,
    },
    Other(Value),
}

impl ErrorInfo {
    pub fn message(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Detailed {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Detailed {
                name: Some(name), ..
            } => name.clone(),
            Self::Detailed { code: Some(code), .. } => format!("error code {}", code),
            Self::Detailed { .. } => "unknown error".to_string(),
            Self::Other(value) => value.to_string(),
        }
    }
}

impl<T> ApiResponse<T> {
    /// Normalize the envelope.
    ///
    /// An `error` field, or `status: "error"`, is a failure. Otherwise the
    /// (possibly absent) `data` is the success value.
    pub fn into_result(self) -> Result<Option<T>, ErrorInfo> {
        if let Some(error) = self.error {
            return Err(match (error, self.message) {
                (ErrorInfo::Detailed { message: None, code, name }, Some(message)) => {
                    ErrorInfo::Detailed {
                        message: Some(message),
                        code,
                        name,
                    }
                }
                (error, _) => error,
            });
        }
        if self.status.as_deref() == Some("error") {
            return Err(ErrorInfo::Text(
                self.message.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        Ok(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ApiResponse<Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_data_only() {
        let result = parse(json!({"data": {"id": 1}})).into_result();
        assert_eq!(result.unwrap(), Some(json!({"id": 1})));
    }

    #[test]
    fn test_status_ok_without_data() {
        let result = parse(json!({"status": "ok"})).into_result();
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_error_shapes() {
        let text = parse(json!({"error": "not found"})).into_result().unwrap_err();
        assert_eq!(text.message(), "not found");

        let detailed = parse(json!({"error": {"message": "slot taken", "code": 409}}))
            .into_result()
            .unwrap_err();
        assert_eq!(detailed.message(), "slot taken");

        let with_message = parse(json!({"error": {}, "message": "pet missing"}))
            .into_result()
            .unwrap_err();
        assert_eq!(with_message.message(), "pet missing");

        let odd = parse(json!({"error": true})).into_result().unwrap_err();
        assert_eq!(odd.message(), "true");
    }

    #[test]
    fn test_error_status_wins_over_data() {
        let result = parse(json!({"status": "error", "message": "denied", "data": {}}))
            .into_result()
            .unwrap_err();
        assert_eq!(result.message(), "denied");
    }
}
