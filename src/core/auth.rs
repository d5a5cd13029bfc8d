//! Two-legged OAuth token exchange and the per-scope token cache.

use crate::core::client::endpoint;
use crate::domain::model::Token;
use crate::utils::error::{Result, ViewerError};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

/// Viewer 前端使用的 scope
pub const PUBLIC_SCOPES: &[&str] = &["viewables:read"];

/// 後端存取 OSS / Model Derivative 使用的 scope
pub const INTERNAL_SCOPES: &[&str] = &[
    "bucket:create",
    "bucket:read",
    "data:read",
    "data:write",
    "data:create",
];

const TOKEN_PATH: &str = "authentication/v2/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Client credentials 交換 access token
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl AuthClient {
    pub fn new(http: Client, base_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http,
            token_url: endpoint(base_url, TOKEN_PATH),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    pub async fn fetch_token(&self, scopes: &[&str]) -> Result<Token> {
        let scope = scopes.join(" ");
        tracing::debug!("Requesting two-legged token for scope '{}'", scope);

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
            .send()
            .await
            .map_err(|e| ViewerError::AuthError {
                message: format!("token request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ViewerError::AuthError {
                message: format!("token endpoint returned {}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| ViewerError::AuthError {
            message: format!("invalid token response: {}", e),
        })?;

        Token::new(token.access_token, token.expires_in)
    }
}

/// 單一 scope 組合的快取，過期時才重新取得
#[derive(Debug)]
struct TokenSlot {
    scopes: &'static [&'static str],
    token: RwLock<Option<Token>>,
}

impl TokenSlot {
    fn new(scopes: &'static [&'static str]) -> Self {
        Self {
            scopes,
            token: RwLock::new(None),
        }
    }

    async fn get(&self, auth: &AuthClient) -> Result<Token> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
                return Ok(token.clone());
            }
        }

        let mut cached = self.token.write().await;

        // 取得寫鎖後再檢查一次，避免重複刷新
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.clone());
        }

        tracing::info!("Refreshing access token for scope '{}'", self.scopes.join(" "));
        let token = auth.fetch_token(self.scopes).await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

/// Public 與 internal 兩組 token，由單一 service 實例持有
#[derive(Debug)]
pub struct TokenManager {
    auth: AuthClient,
    public: TokenSlot,
    internal: TokenSlot,
}

impl TokenManager {
    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth,
            public: TokenSlot::new(PUBLIC_SCOPES),
            internal: TokenSlot::new(INTERNAL_SCOPES),
        }
    }

    pub async fn get_public_token(&self) -> Result<Token> {
        self.public.get(&self.auth).await
    }

    pub async fn get_internal_token(&self) -> Result<Token> {
        self.internal.get(&self.auth).await
    }
}
