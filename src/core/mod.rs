pub mod archive;
pub mod auth;
pub mod client;
pub mod derivative;
pub mod oss;
pub mod service;
pub mod urn;

pub use crate::domain::model::{BucketObject, ObjectDetails, Token, TranslationJob, TranslationStatus};
pub use crate::domain::ports::{ConfigProvider, ModelService};
pub use crate::utils::error::Result;
