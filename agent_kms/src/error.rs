use agent_shared::error::SharedError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KmsError {
    /// The KMS answered with a non-2xx status.
    #[error("Error {operation}: {} {reason}{}", .status.as_u16(), format_body(.body))]
    Response {
        operation: &'static str,
        status: StatusCode,
        reason: String,
        body: Option<Value>,
    },
    #[error("Unknown error while creating profile")]
    UnknownProfileError,
    #[error("Error {operation}: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Error decoding signature: {0}")]
    SignatureDecoding(#[from] base64::DecodeError),
    #[error(transparent)]
    Url(#[from] SharedError),
}

fn format_body(body: &Option<Value>) -> String {
    body.as_ref().map(|body| format!("; {body}")).unwrap_or_default()
}

impl KmsError {
    pub(crate) async fn from_response(operation: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
            .is_some_and(|content_type| content_type.contains("json"));

        let body = if is_json { response.json().await.ok() } else { None };

        KmsError::Response {
            operation,
            status,
            reason,
            body,
        }
    }

    /// The HTTP status of a [`KmsError::Response`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            KmsError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The structured error body of a [`KmsError::Response`], if the KMS sent one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            KmsError::Response { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Whether the KMS rejected a profile creation because the profile is already there.
    pub(crate) fn is_profile_already_exists(&self) -> bool {
        self.status() == Some(StatusCode::BAD_REQUEST)
            && self
                .body()
                .and_then(|body| body.get("detail"))
                .and_then(Value::as_str)
                .is_some_and(|detail| detail.contains("already exists"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_error_message_includes_the_body() {
        let error = KmsError::Response {
            operation: "retrieving key",
            status: StatusCode::NOT_FOUND,
            reason: "Not Found".to_string(),
            body: Some(json!({"detail": "Key not found"})),
        };

        assert_eq!(
            error.to_string(),
            r#"Error retrieving key: 404 Not Found; {"detail":"Key not found"}"#
        );
    }
}
