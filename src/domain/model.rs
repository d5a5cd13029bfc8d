use crate::utils::error::{Result, ViewerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer token 與其絕對到期時間
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// `expires_in_secs` 超出可表示範圍時回傳 [`ViewerError::AuthError`]
    pub fn new(access_token: String, expires_in_secs: i64) -> Result<Self> {
        let expires_at = chrono::Duration::try_seconds(expires_in_secs)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| ViewerError::AuthError {
                message: format!("token lifetime of {} seconds is out of range", expires_in_secs),
            })?;

        Ok(Self {
            access_token,
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// 剩餘有效秒數（四捨五入），已過期時為 0
    pub fn expires_in(&self) -> i64 {
        let remaining_ms = (self.expires_at - Utc::now()).num_milliseconds();
        ((remaining_ms as f64) / 1000.0).round().max(0.0) as i64
    }
}

/// `GET /api/auth/token` 的回應格式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicToken {
    pub access_token: String,
    pub expires_in: i64,
}

impl From<&Token> for PublicToken {
    fn from(token: &Token) -> Self {
        Self {
            access_token: token.access_token.clone(),
            expires_in: token.expires_in(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketObject {
    pub name: String,
    pub urn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationStatus {
    pub status: String,
    pub progress: String,
    pub messages: Vec<String>,
}

impl TranslationStatus {
    /// 尚未提交轉檔（manifest 不存在）
    pub fn not_available() -> Self {
        Self {
            status: "n/a".to_string(),
            progress: String::new(),
            messages: Vec::new(),
        }
    }
}

/// OSS object record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDetails {
    pub bucket_key: String,
    pub object_id: String,
    pub object_key: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationJob {
    pub result: String,
    pub urn: String,
}
