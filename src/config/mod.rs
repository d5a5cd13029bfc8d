pub mod toml_config;

use crate::core::client::DEFAULT_BASE_URL;
use crate::core::oss::DEFAULT_CHUNK_SIZE;
use crate::core::service::default_bucket_key;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_bucket_key, validate_non_empty_string, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use clap::Parser;
use toml_config::TomlConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STATIC_DIR: &str = "wwwroot";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 100;

/// 舊版 Forge 範例使用的環境變數名稱
const LEGACY_CLIENT_ID: &str = "FORGE_CLIENT_ID";
const LEGACY_CLIENT_SECRET: &str = "FORGE_CLIENT_SECRET";
const LEGACY_BUCKET: &str = "FORGE_BUCKET";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "aps-simple-viewer")]
#[command(about = "Backend for a browser-based APS model viewer")]
pub struct CliConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "APS_CONFIG")]
    pub config: Option<String>,

    #[arg(long, env = "APS_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, env = "APS_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Bucket key; defaults to `<client id>-basic-app`
    #[arg(long, env = "APS_BUCKET")]
    pub bucket: Option<String>,

    #[arg(long, env = "APS_BASE_URL")]
    pub base_url: Option<String>,

    /// Storage region for newly created buckets (US, EMEA, ...)
    #[arg(long, env = "APS_REGION")]
    pub region: Option<String>,

    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory with the viewer front-end
    #[arg(long)]
    pub static_dir: Option<String>,

    #[arg(long)]
    pub max_upload_mb: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

/// 合併命令列、環境變數與 TOML 後的最終設定
#[derive(Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub bucket: Option<String>,
    pub base_url: String,
    pub region: Option<String>,
    pub upload_chunk_size: usize,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub max_upload_mb: usize,
    pub verbose: bool,
    pub json_logs: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("bucket", &self.bucket)
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .field("upload_chunk_size", &self.upload_chunk_size)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .field("max_upload_mb", &self.max_upload_mb)
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl AppConfig {
    /// 只有憑證、其餘使用預設值
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            bucket: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            region: None,
            upload_chunk_size: DEFAULT_CHUNK_SIZE,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            verbose: false,
            json_logs: false,
        }
    }

    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Self::merge(cli, file.as_ref(), |name| std::env::var(name).ok())
    }

    /// 優先順序：命令列 / APS_* 環境變數 > FORGE_* 環境變數 > TOML > 預設值
    pub fn merge(
        cli: &CliConfig,
        file: Option<&TomlConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let default_file = TomlConfig::default();
        let file = file.unwrap_or(&default_file);

        let client_id = non_empty(cli.client_id.as_deref())
            .or_else(|| non_empty(env(LEGACY_CLIENT_ID).as_deref()))
            .or_else(|| non_empty(file.aps.client_id.as_deref()));
        let client_id = validate_required_field("APS_CLIENT_ID", &client_id)?.clone();

        let client_secret = non_empty(cli.client_secret.as_deref())
            .or_else(|| non_empty(env(LEGACY_CLIENT_SECRET).as_deref()))
            .or_else(|| non_empty(file.aps.client_secret.as_deref()));
        let client_secret = validate_required_field("APS_CLIENT_SECRET", &client_secret)?.clone();

        let bucket = non_empty(cli.bucket.as_deref())
            .or_else(|| non_empty(env(LEGACY_BUCKET).as_deref()))
            .or_else(|| non_empty(file.aps.bucket.as_deref()));

        Ok(Self {
            client_id,
            client_secret,
            bucket,
            base_url: non_empty(cli.base_url.as_deref())
                .or_else(|| non_empty(file.aps.base_url.as_deref()))
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            region: non_empty(cli.region.as_deref())
                .or_else(|| non_empty(file.aps.region.as_deref())),
            upload_chunk_size: file.aps.upload_chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            host: non_empty(cli.host.as_deref())
                .or_else(|| non_empty(file.server.host.as_deref()))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            static_dir: non_empty(cli.static_dir.as_deref())
                .or_else(|| non_empty(file.server.static_dir.as_deref()))
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            max_upload_mb: cli
                .max_upload_mb
                .or(file.server.max_upload_mb)
                .unwrap_or(DEFAULT_MAX_UPLOAD_MB),
            verbose: cli.verbose || file.logging.verbose.unwrap_or(false),
            json_logs: cli.json_logs || file.logging.json.unwrap_or(false),
        })
    }

    pub fn bucket_key(&self) -> String {
        self.bucket
            .clone()
            .unwrap_or_else(|| default_bucket_key(&self.client_id))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl ConfigProvider for AppConfig {
    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn client_secret(&self) -> &str {
        &self.client_secret
    }

    fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn upload_chunk_size(&self) -> usize {
        self.upload_chunk_size
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("aps.client_id", &self.client_id)?;
        validate_non_empty_string("aps.client_secret", &self.client_secret)?;
        validate_url("aps.base_url", &self.base_url)?;
        validate_bucket_key("aps.bucket", &self.bucket_key())?;
        validate_positive_number("aps.upload_chunk_size", self.upload_chunk_size, 1)?;
        validate_range("server.port", self.port, 1, u16::MAX)?;
        validate_positive_number("server.max_upload_mb", self.max_upload_mb, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ViewerError;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn cli_with_credentials() -> CliConfig {
        CliConfig {
            client_id: Some("CliClient".to_string()),
            client_secret: Some("cli-secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::merge(&cli_with_credentials(), None, no_env).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.static_dir, "wwwroot");
        assert_eq!(config.max_upload_bytes(), 100 * 1024 * 1024);
        assert_eq!(config.bucket_key(), "cliclient-basic-app");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let err = AppConfig::merge(&CliConfig::default(), None, no_env).unwrap_err();
        assert!(matches!(err, ViewerError::MissingConfigError { ref field } if field == "APS_CLIENT_ID"));

        let only_id = CliConfig {
            client_id: Some("id".to_string()),
            ..Default::default()
        };
        let err = AppConfig::merge(&only_id, None, no_env).unwrap_err();
        assert!(matches!(err, ViewerError::MissingConfigError { ref field } if field == "APS_CLIENT_SECRET"));
    }

    #[test]
    fn test_legacy_forge_variables() {
        let env: HashMap<&str, &str> = [
            ("FORGE_CLIENT_ID", "legacy-id"),
            ("FORGE_CLIENT_SECRET", "legacy-secret"),
            ("FORGE_BUCKET", "legacy-bucket"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::merge(&CliConfig::default(), None, |name| {
            env.get(name).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.client_id, "legacy-id");
        assert_eq!(config.client_secret, "legacy-secret");
        assert_eq!(config.bucket.as_deref(), Some("legacy-bucket"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = TomlConfig::from_toml_str(
            r#"
[aps]
client_id = "file-id"
client_secret = "file-secret"
bucket = "file-bucket"
region = "EMEA"

[server]
port = 3000
static_dir = "public"
"#,
        )
        .unwrap();

        let cli = CliConfig {
            client_id: Some("cli-id".to_string()),
            port: Some(4000),
            ..Default::default()
        };

        let config = AppConfig::merge(&cli, Some(&file), no_env).unwrap();
        assert_eq!(config.client_id, "cli-id");
        assert_eq!(config.client_secret, "file-secret");
        assert_eq!(config.bucket.as_deref(), Some("file-bucket"));
        assert_eq!(config.region.as_deref(), Some("EMEA"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.static_dir, "public");
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let cli = CliConfig {
            bucket: Some("   ".to_string()),
            ..cli_with_credentials()
        };
        let config = AppConfig::merge(&cli, None, no_env).unwrap();
        assert!(config.bucket.is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::new("id", "secret");
        config.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::new("id", "secret");
        config.bucket = Some("Bad Bucket".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::new("id", "secret");
        config.max_upload_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = AppConfig::new("id", "super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_cli_parsing() {
        let cli = CliConfig::try_parse_from([
            "aps-simple-viewer",
            "--client-id",
            "abc",
            "--client-secret",
            "xyz",
            "--port",
            "9090",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.client_id.as_deref(), Some("abc"));
        assert_eq!(cli.port, Some(9090));
        assert!(cli.verbose);
    }
}
