//! Object Storage Service (OSS): bucket provisioning, listing and signed uploads.

use crate::core::client::{encode_segment, endpoint, ensure_success, handle_response};
use crate::domain::model::ObjectDetails;
use crate::utils::error::{Result, ViewerError};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// 每頁最多取回的 object 數
pub const PAGE_SIZE: u32 = 64;

/// S3 multipart 的每段大小（APS 建議 5 MiB 以上）
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// `signeds3upload` 單次最多核發的 URL 數
const MAX_URLS_PER_REQUEST: usize = 25;

/// 新建 bucket 的保存政策
const BUCKET_POLICY: &str = "temporary";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucketPayload<'a> {
    bucket_key: &'a str,
    policy_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct ObjectPage {
    #[serde(default)]
    items: Vec<ObjectDetails>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignedUpload {
    upload_key: String,
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteUpload<'a> {
    upload_key: &'a str,
}

#[derive(Debug, Clone)]
pub struct OssClient {
    http: Client,
    base_url: String,
    region: Option<String>,
    chunk_size: usize,
}

impl OssClient {
    pub fn new(http: Client, base_url: &str, region: Option<&str>, chunk_size: usize) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            region: region.map(str::to_string),
            chunk_size: chunk_size.max(1),
        }
    }

    fn bucket_url(&self, bucket: &str, rest: &str) -> String {
        endpoint(
            &self.base_url,
            &format!("oss/v2/buckets/{}{}", encode_segment(bucket), rest),
        )
    }

    fn signed_upload_url(&self, bucket: &str, object_name: &str) -> String {
        self.bucket_url(
            bucket,
            &format!("/objects/{}/signeds3upload", encode_segment(object_name)),
        )
    }

    pub async fn bucket_details(&self, token: &str, bucket: &str) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(self.bucket_url(bucket, "/details"))
            .bearer_auth(token)
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn create_bucket(&self, token: &str, bucket: &str) -> Result<()> {
        let mut request = self
            .http
            .post(endpoint(&self.base_url, "oss/v2/buckets"))
            .bearer_auth(token)
            .json(&CreateBucketPayload {
                bucket_key: bucket,
                policy_key: BUCKET_POLICY,
            });
        if let Some(region) = &self.region {
            request = request.header("x-ads-region", region);
        }

        ensure_success(request.send().await?).await?;
        Ok(())
    }

    /// 查詢 bucket，404 時建立
    pub async fn ensure_bucket_exists(&self, token: &str, bucket: &str) -> Result<()> {
        match self.bucket_details(token, bucket).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!("🪣 Bucket '{}' not found, creating it", bucket);
                self.create_bucket(token, bucket).await
            }
            Err(e) => Err(e),
        }
    }

    async fn object_page(
        &self,
        token: &str,
        bucket: &str,
        start_at: Option<&str>,
    ) -> Result<ObjectPage> {
        let limit = PAGE_SIZE.to_string();
        let mut request = self
            .http
            .get(self.bucket_url(bucket, "/objects"))
            .bearer_auth(token)
            .query(&[("limit", limit.as_str())]);
        if let Some(start_at) = start_at {
            request = request.query(&[("startAt", start_at)]);
        }

        handle_response(request.send().await?).await
    }

    /// 走訪所有分頁，直到回應不再帶 `next`
    pub async fn list_objects(&self, token: &str, bucket: &str) -> Result<Vec<ObjectDetails>> {
        self.ensure_bucket_exists(token, bucket).await?;

        let mut page = self.object_page(token, bucket, None).await?;
        let mut objects = std::mem::take(&mut page.items);
        let mut seen_cursors: HashSet<String> = HashSet::new();

        while let Some(next) = page.next.as_deref().filter(|n| !n.is_empty()) {
            let cursor = self.start_at_from_next(next)?;
            if !seen_cursors.insert(cursor.clone()) {
                return Err(ViewerError::ResponseFormatError {
                    message: format!("pagination returned cursor '{}' twice", cursor),
                });
            }

            tracing::debug!("Fetching next object page starting at '{}'", cursor);
            page = self.object_page(token, bucket, Some(&cursor)).await?;
            objects.append(&mut page.items);
        }

        tracing::debug!("Listed {} objects in bucket '{}'", objects.len(), bucket);
        Ok(objects)
    }

    fn start_at_from_next(&self, next: &str) -> Result<String> {
        let url = match Url::parse(next) {
            Ok(url) => url,
            // 相對路徑時以 base url 補齊
            Err(_) => Url::parse(&self.base_url)
                .and_then(|base| base.join(next))
                .map_err(|e| ViewerError::ResponseFormatError {
                    message: format!("invalid next page link '{}': {}", next, e),
                })?,
        };

        url.query_pairs()
            .find(|(key, _)| key == "startAt")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| ViewerError::ResponseFormatError {
                message: format!("next page link '{}' has no startAt parameter", next),
            })
    }

    async fn request_upload_urls(
        &self,
        token: &str,
        bucket: &str,
        object_name: &str,
        first_part: usize,
        parts: usize,
        upload_key: Option<&str>,
    ) -> Result<SignedUpload> {
        let mut request = self
            .http
            .get(self.signed_upload_url(bucket, object_name))
            .bearer_auth(token)
            .query(&[
                ("parts", parts.to_string()),
                ("firstPart", first_part.to_string()),
            ]);
        if let Some(key) = upload_key {
            request = request.query(&[("uploadKey", key)]);
        }

        let signed: SignedUpload = handle_response(request.send().await?).await?;
        if signed.urls.len() < parts {
            return Err(ViewerError::ResponseFormatError {
                message: format!(
                    "requested {} upload URLs but received {}",
                    parts,
                    signed.urls.len()
                ),
            });
        }
        Ok(signed)
    }

    async fn put_part(&self, url: &str, part_number: usize, chunk: Bytes) -> Result<()> {
        let size = chunk.len();
        let response = self
            .http
            .put(url)
            .body(chunk)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ViewerError::UploadError {
                message: format!("part {} rejected with {}: {}", part_number, status, body),
            });
        }

        tracing::debug!("Uploaded part {} ({} bytes)", part_number, size);
        Ok(())
    }

    /// Signed S3 upload：取得 URL、逐段 PUT、最後通知 OSS 完成
    pub async fn upload_object(
        &self,
        token: &str,
        bucket: &str,
        object_name: &str,
        content: Bytes,
    ) -> Result<ObjectDetails> {
        self.ensure_bucket_exists(token, bucket).await?;

        let chunks = split_chunks(&content, self.chunk_size);
        let total = chunks.len();
        tracing::info!(
            "⬆️ Uploading '{}' ({} bytes, {} part(s)) to bucket '{}'",
            object_name,
            content.len(),
            total,
            bucket
        );

        let mut upload_key: Option<String> = None;
        let mut urls: Vec<String> = Vec::with_capacity(total);

        for (index, chunk) in chunks.into_iter().enumerate() {
            if index >= urls.len() {
                let batch = (total - index).min(MAX_URLS_PER_REQUEST);
                let signed = self
                    .request_upload_urls(
                        token,
                        bucket,
                        object_name,
                        index + 1,
                        batch,
                        upload_key.as_deref(),
                    )
                    .await?;
                upload_key = Some(signed.upload_key);
                urls.extend(signed.urls.into_iter().take(batch));
            }

            self.put_part(&urls[index], index + 1, chunk).await?;
        }

        let upload_key = upload_key.ok_or_else(|| ViewerError::UploadError {
            message: "no upload key was issued".to_string(),
        })?;

        let response = self
            .http
            .post(self.signed_upload_url(bucket, object_name))
            .bearer_auth(token)
            .json(&CompleteUpload {
                upload_key: &upload_key,
            })
            .send()
            .await?;
        handle_response(response).await
    }
}

/// 切成固定大小的段落；空內容仍視為一段
fn split_chunks(content: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    if content.is_empty() {
        return vec![Bytes::new()];
    }

    (0..content.len())
        .step_by(chunk_size)
        .map(|start| content.slice(start..(start + chunk_size).min(content.len())))
        .collect()
}
