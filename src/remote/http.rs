use crate::core::models::{AccountSnapshot, GrantResponse};
use crate::remote::{AccountClient, ClientError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = "okhttp/4.12.0";
const JSON_UTF8: &str = "application/json; charset=UTF-8";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrantRequest<'a> {
    uid: &'a str,
    email: &'a str,
    device_id: &'a str,
}

pub struct HttpAccountClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAccountClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL cannot carry a path: {base_url}");
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    let unreachable = e.is_connect() || e.is_timeout();
    ClientError::Network {
        detail: e.without_url().to_string(),
        unreachable,
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Protocol {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl AccountClient for HttpAccountClient {
    async fn fetch_account(&self, uid: &str) -> Result<AccountSnapshot, ClientError> {
        let url = self.endpoint(&["api", "getUser", uid]);
        tracing::debug!(uid, "Fetching account");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        decode_json(response).await
    }

    async fn grant_points(
        &self,
        uid: &str,
        email: &str,
        device_id: &str,
    ) -> Result<GrantResponse, ClientError> {
        let url = self.endpoint(&["api", "addPointGame"]);
        let payload = GrantRequest {
            uid,
            email,
            device_id,
        };
        let body = serde_json::to_string(&payload)
            .map_err(|e| ClientError::Decode(format!("failed to encode request: {e}")))?;
        tracing::debug!(uid, "Granting points");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_UTF8)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        decode_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account_body(points: i64) -> serde_json::Value {
        serde_json::json!({
            "uid": "u1",
            "email": "a@b.com",
            "point": points,
            "totalGame": 4,
            "codeInvite": "INV1",
            "totalReferral": 2
        })
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(HttpAccountClient::new("not a url").is_err());
        assert!(HttpAccountClient::new("mailto:a@b.com").is_err());
    }

    #[test]
    fn test_endpoint_escapes_uid_and_keeps_base_path() {
        let client = HttpAccountClient::new("http://example.com/game/").unwrap();
        let url = client.endpoint(&["api", "getUser", "a b/c"]);
        assert_eq!(url.as_str(), "http://example.com/game/api/getUser/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_fetch_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/getUser/u1"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(account_body(1234)))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAccountClient::new(&server.uri()).unwrap();
        let snapshot = client.fetch_account("u1").await.unwrap();

        assert_eq!(snapshot.points, 1234);
        assert_eq!(snapshot.total_games, 4);
        assert_eq!(snapshot.invite_code.as_deref(), Some("INV1"));
        assert_eq!(snapshot.total_referrals, 2);
    }

    #[tokio::test]
    async fn test_fetch_account_non_success_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/getUser/u1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpAccountClient::new(&server.uri()).unwrap();
        let err = client.fetch_account("u1").await.unwrap_err();

        assert_eq!(
            err,
            ClientError::Protocol {
                status: 404,
                reason: "Not Found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_account_bad_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/getUser/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = HttpAccountClient::new(&server.uri()).unwrap();
        let err = client.fetch_account("u1").await.unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_grant_points_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/addPointGame"))
            .and(header("content-type", JSON_UTF8))
            .and(body_json(serde_json::json!({
                "uid": "u1",
                "email": "a@b.com",
                "deviceId": "d1"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"message": "points added"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAccountClient::new(&server.uri()).unwrap();
        let response = client.grant_points("u1", "a@b.com", "d1").await.unwrap();

        assert_eq!(response.message, "points added");
    }

    #[tokio::test]
    async fn test_grant_points_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/addPointGame"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpAccountClient::new(&server.uri()).unwrap();
        let err = client.grant_points("u1", "a@b.com", "d1").await.unwrap_err();

        assert!(matches!(err, ClientError::Protocol { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpAccountClient::new(&format!("http://{addr}")).unwrap();
        let err = client.fetch_account("u1").await.unwrap_err();

        assert!(matches!(err, ClientError::Network { .. }), "got {err:?}");
    }
}
