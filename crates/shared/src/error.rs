use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The service could not be reached or the connection broke.
    Transport,
    /// The service answered with a body that does not match the envelope.
    Decode,
    /// The service answered with a non-success `StatusCode`.
    Rejected,
    NotFound,
    /// Refused on the client before anything was sent.
    Validation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_snake_case() {
        let err = ApiError::new(ErrorCode::NotFound, "Policy not found");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["message"], "Policy not found");
    }
}
