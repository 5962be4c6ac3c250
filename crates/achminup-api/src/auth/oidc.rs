use super::{AuthError, IdentityProvider};
use achminup_core::Identity;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use std::time::Duration;

/// OIDC userinfo endpoint client. The caller's `Authorization` header is
/// forwarded verbatim and the `sub` claim of the response is the identity.
#[derive(Clone, Debug)]
pub struct OidcUserInfoClient {
    client: reqwest::Client,
    userinfo_url: String,
}

impl OidcUserInfoClient {
    pub fn new(userinfo_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Client(e.to_string()))?;

        Ok(Self {
            client,
            userinfo_url: userinfo_url.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for OidcUserInfoClient {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .header(AUTHORIZATION, authorization.unwrap_or_default())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(AuthError::Rejected(response.status().as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        body.get("sub")
            .and_then(|sub| sub.as_str())
            .map(Identity::new)
            .ok_or(AuthError::MissingSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    async fn userinfo(headers: HeaderMap) -> (axum::http::StatusCode, Json<serde_json::Value>) {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        match token {
            "Bearer good" => (axum::http::StatusCode::OK, Json(json!({ "sub": "alice" }))),
            "Bearer no-sub" => (
                axum::http::StatusCode::OK,
                Json(json!({ "email": "a@example.com" })),
            ),
            "Bearer numeric-sub" => (axum::http::StatusCode::OK, Json(json!({ "sub": 42 }))),
            _ => (
                axum::http::StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid_token" })),
            ),
        }
    }

    async fn mock_provider() -> OidcUserInfoClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/o/oauth2/userinfo", get(userinfo));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        OidcUserInfoClient::new(
            format!("http://{}/o/oauth2/userinfo", addr),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_subject() {
        let client = mock_provider().await;
        let identity = client.authenticate(Some("Bearer good")).await.unwrap();
        assert_eq!(identity.as_str(), "alice");
    }

    #[tokio::test]
    async fn test_rejected_token() {
        let client = mock_provider().await;
        let result = client.authenticate(Some("Bearer expired")).await;
        assert!(matches!(result, Err(AuthError::Rejected(401))));
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let client = mock_provider().await;
        let result = client.authenticate(None).await;
        assert!(matches!(result, Err(AuthError::Rejected(401))));
    }

    #[tokio::test]
    async fn test_subject_must_be_a_string() {
        let client = mock_provider().await;

        let result = client.authenticate(Some("Bearer no-sub")).await;
        assert!(matches!(result, Err(AuthError::MissingSubject)));

        let result = client.authenticate(Some("Bearer numeric-sub")).await;
        assert!(matches!(result, Err(AuthError::MissingSubject)));
    }
}
