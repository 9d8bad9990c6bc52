mod http;

use crate::core::models::{AccountSnapshot, ErrorKind, GrantResponse};
use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpAccountClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error: {detail}")]
    Network { detail: String, unreachable: bool },
    #[error("HTTP {status}: {reason}")]
    Protocol { status: u16, reason: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network { .. } => ErrorKind::Network,
            ClientError::Protocol { .. } => ErrorKind::Protocol,
            ClientError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Operator-facing text. Recognised connectivity failures get a plainer
    /// explanation, with the original detail kept alongside it.
    pub fn friendly_message(&self) -> String {
        match self {
            ClientError::Network {
                detail,
                unreachable: true,
            } => format!("connectivity error, check your network connection ({detail})"),
            other => other.to_string(),
        }
    }
}

#[async_trait]
pub trait AccountClient: Send + Sync {
    async fn fetch_account(&self, uid: &str) -> Result<AccountSnapshot, ClientError>;

    /// Not idempotent: a repeated call may grant twice.
    async fn grant_points(
        &self,
        uid: &str,
        email: &str,
        device_id: &str,
    ) -> Result<GrantResponse, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let network = ClientError::Network {
            detail: "refused".to_string(),
            unreachable: true,
        };
        assert_eq!(network.kind(), ErrorKind::Network);

        let protocol = ClientError::Protocol {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(protocol.kind(), ErrorKind::Protocol);
        assert_eq!(protocol.to_string(), "HTTP 503: Service Unavailable");

        assert_eq!(ClientError::Decode("eof".to_string()).kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_friendly_message_keeps_detail() {
        let unreachable = ClientError::Network {
            detail: "connection refused".to_string(),
            unreachable: true,
        };
        let message = unreachable.friendly_message();
        assert!(message.starts_with("connectivity error"));
        assert!(message.contains("connection refused"));

        let other = ClientError::Network {
            detail: "body stream closed".to_string(),
            unreachable: false,
        };
        assert_eq!(other.friendly_message(), "network error: body stream closed");
    }
}
