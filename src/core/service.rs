use crate::core::archive::ensure_entrypoint;
use crate::core::auth::{AuthClient, TokenManager};
use crate::core::client::build_http_client;
use crate::core::derivative::DerivativeClient;
use crate::core::oss::OssClient;
use crate::core::urn::urn_from_object_id;
use crate::domain::model::{BucketObject, ObjectDetails, Token, TranslationJob, TranslationStatus};
use crate::domain::ports::{ConfigProvider, ModelService};
use crate::utils::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// 未指定 bucket 時的預設名稱
pub fn default_bucket_key(client_id: &str) -> String {
    format!("{}-basic-app", client_id.to_lowercase())
}

/// 所有 APS 呼叫的進入點；process 內只建立一個實例
pub struct ApsService {
    tokens: TokenManager,
    oss: OssClient,
    derivative: DerivativeClient,
    bucket: String,
}

impl ApsService {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let http = build_http_client(HTTP_TIMEOUT)?;
        let base_url = config.base_url();

        let bucket = config
            .bucket()
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_bucket_key(config.client_id()));

        tracing::debug!("APS service using bucket '{}' at {}", bucket, base_url);

        Ok(Self {
            tokens: TokenManager::new(AuthClient::new(
                http.clone(),
                base_url,
                config.client_id(),
                config.client_secret(),
            )),
            oss: OssClient::new(
                http.clone(),
                base_url,
                config.region(),
                config.upload_chunk_size(),
            ),
            derivative: DerivativeClient::new(http, base_url),
            bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn get_public_token(&self) -> Result<Token> {
        self.tokens.get_public_token().await
    }

    pub async fn get_internal_token(&self) -> Result<Token> {
        self.tokens.get_internal_token().await
    }

    pub async fn get_objects(&self) -> Result<Vec<ObjectDetails>> {
        let token = self.get_internal_token().await?;
        self.oss.list_objects(&token.access_token, &self.bucket).await
    }

    pub async fn upload_object(&self, object_name: &str, content: Bytes) -> Result<ObjectDetails> {
        let token = self.get_internal_token().await?;
        self.oss
            .upload_object(&token.access_token, &self.bucket, object_name, content)
            .await
    }

    pub async fn translate_model(
        &self,
        object_id: &str,
        root_filename: Option<&str>,
    ) -> Result<TranslationJob> {
        let token = self.get_internal_token().await?;
        self.derivative
            .translate(&token.access_token, object_id, root_filename)
            .await
    }

    /// manifest 不存在（尚未轉檔）時回傳 `n/a`
    pub async fn get_translation_status(&self, urn: &str) -> Result<TranslationStatus> {
        let token = self.get_internal_token().await?;
        match self.derivative.manifest_status(&token.access_token, urn).await {
            Ok(status) => Ok(status),
            Err(e) if e.is_not_found() => {
                tracing::debug!("No manifest for '{}' yet", urn);
                Ok(TranslationStatus::not_available())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ModelService for ApsService {
    async fn public_token(&self) -> Result<Token> {
        self.get_public_token().await
    }

    async fn list_models(&self) -> Result<Vec<BucketObject>> {
        let objects = self.get_objects().await?;
        Ok(objects
            .into_iter()
            .map(|o| BucketObject {
                urn: urn_from_object_id(&o.object_id),
                name: o.object_key,
            })
            .collect())
    }

    async fn upload_model(
        &self,
        file_name: &str,
        content: Bytes,
        entrypoint: Option<&str>,
    ) -> Result<BucketObject> {
        let entrypoint = entrypoint.map(str::trim).filter(|e| !e.is_empty());
        if let Some(entrypoint) = entrypoint {
            ensure_entrypoint(&content, entrypoint)?;
        }

        let object = self.upload_object(file_name, content).await?;
        let job = self.translate_model(&object.object_id, entrypoint).await?;
        tracing::info!("✅ '{}' uploaded, translation {}", object.object_key, job.result);

        Ok(BucketObject {
            name: object.object_key,
            urn: job.urn,
        })
    }

    async fn translation_status(&self, urn: &str) -> Result<TranslationStatus> {
        self.get_translation_status(urn).await
    }
}
