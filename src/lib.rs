pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::routes::{create_router, RouterOptions};
pub use config::{AppConfig, CliConfig};
pub use crate::core::service::ApsService;
pub use domain::model::{BucketObject, Token, TranslationStatus};
pub use domain::ports::{ConfigProvider, ModelService};
pub use utils::error::{Result, ViewerError};
