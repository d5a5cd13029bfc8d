use crate::domain::model::{BucketObject, Token, TranslationStatus};
use crate::utils::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub trait ConfigProvider: Send + Sync {
    fn client_id(&self) -> &str;
    fn client_secret(&self) -> &str;
    /// 未設定時使用 `{client_id}-basic-app`
    fn bucket(&self) -> Option<&str>;
    fn base_url(&self) -> &str;
    fn region(&self) -> Option<&str>;
    fn upload_chunk_size(&self) -> usize;
}

/// Viewer 前端需要的四個操作；HTTP 層只依賴這個 trait
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn public_token(&self) -> Result<Token>;
    async fn list_models(&self) -> Result<Vec<BucketObject>>;
    async fn upload_model(
        &self,
        file_name: &str,
        content: Bytes,
        entrypoint: Option<&str>,
    ) -> Result<BucketObject>;
    async fn translation_status(&self, urn: &str) -> Result<TranslationStatus>;
}
