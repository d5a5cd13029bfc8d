//! Model Derivative API: translation jobs and manifests.

use crate::core::client::{encode_segment, endpoint, handle_response};
use crate::core::urn::urn_from_object_id;
use crate::domain::model::{TranslationJob, TranslationStatus};
use crate::utils::error::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const JOB_PATH: &str = "modelderivative/v2/designdata/job";

#[derive(Debug, Serialize)]
pub struct JobPayload {
    pub input: JobInput,
    pub output: JobOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    pub urn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_urn: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct JobOutput {
    pub formats: Vec<OutputFormat>,
}

#[derive(Debug, Serialize)]
pub struct OutputFormat {
    #[serde(rename = "type")]
    pub kind: String,
    pub views: Vec<String>,
}

impl JobPayload {
    /// SVF 2D + 3D；有 root filename 時視為壓縮檔
    pub fn svf(object_id: &str, root_filename: Option<&str>) -> Self {
        let root_filename = root_filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let compressed_urn = root_filename.as_ref().map(|_| true);

        Self {
            input: JobInput {
                urn: urn_from_object_id(object_id),
                root_filename,
                compressed_urn,
            },
            output: JobOutput {
                formats: vec![OutputFormat {
                    kind: "svf".to_string(),
                    views: vec!["2d".to_string(), "3d".to_string()],
                }],
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct DerivativeClient {
    http: Client,
    base_url: String,
}

impl DerivativeClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    pub async fn translate(
        &self,
        token: &str,
        object_id: &str,
        root_filename: Option<&str>,
    ) -> Result<TranslationJob> {
        let payload = JobPayload::svf(object_id, root_filename);
        tracing::info!(
            "🔄 Starting translation for '{}' (root: {:?})",
            object_id,
            payload.input.root_filename
        );

        let response = self
            .http
            .post(endpoint(&self.base_url, JOB_PATH))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn manifest(&self, token: &str, urn: &str) -> Result<Value> {
        let path = format!("modelderivative/v2/designdata/{}/manifest", encode_segment(urn));
        let response = self
            .http
            .get(endpoint(&self.base_url, &path))
            .bearer_auth(token)
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn manifest_status(&self, token: &str, urn: &str) -> Result<TranslationStatus> {
        let manifest = self.manifest(token, urn).await?;
        Ok(status_from_manifest(&manifest))
    }
}

/// 從 manifest 取出狀態、進度與所有 error 訊息
///
/// 先收集 `derivatives[*].messages`，再收集 `derivatives[*].children[*].messages`。
pub fn status_from_manifest(manifest: &Value) -> TranslationStatus {
    let derivatives = array(manifest.get("derivatives"));

    let mut messages: Vec<String> = derivatives
        .iter()
        .flat_map(|derivative| error_messages(derivative.get("messages")))
        .collect();

    messages.extend(
        derivatives
            .iter()
            .flat_map(|derivative| array(derivative.get("children")))
            .flat_map(|child| error_messages(child.get("messages"))),
    );

    TranslationStatus {
        status: string_field(manifest, "status"),
        progress: string_field(manifest, "progress"),
        messages,
    }
}

fn array(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn error_messages(value: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    array(value)
        .iter()
        .filter(|message| message.get("type").and_then(Value::as_str) == Some("error"))
        .filter_map(|message| message.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
