use anyhow::{Context, Result};
use aps_simple_viewer::core::urn::urn_from_object_id;
use aps_simple_viewer::domain::model::PublicToken;
use aps_simple_viewer::utils::{logger, validation::Validate};
use aps_simple_viewer::{ApsService, AppConfig, CliConfig, ModelService};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aps-cli")]
#[command(about = "Inspect and manage the viewer bucket from the command line")]
struct Args {
    #[command(flatten)]
    config: CliConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a viewer (public) token as JSON
    Token,
    /// List the models in the bucket
    List,
    /// Upload a model and start its translation
    Upload {
        file: PathBuf,
        /// Entry file inside a ZIP archive
        #[arg(long)]
        entrypoint: Option<String>,
    },
    /// Show the translation status of a model
    Status { urn: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.config.verbose);

    let config = AppConfig::resolve(&args.config)?;
    config.validate()?;
    let service = ApsService::new(&config)?;

    match args.command {
        Command::Token => {
            let token = service.public_token().await?;
            println!("{}", serde_json::to_string_pretty(&PublicToken::from(&token))?);
        }
        Command::List => {
            let objects = service.get_objects().await?;
            println!("📋 {} object(s) in bucket '{}'", objects.len(), service.bucket());
            for object in objects {
                let size = object
                    .size
                    .map(|s| format!("{} bytes", s))
                    .unwrap_or_else(|| "unknown size".to_string());
                println!(
                    "  - {} ({})\n    urn: {}",
                    object.object_key,
                    size,
                    urn_from_object_id(&object.object_id)
                );
            }
        }
        Command::Upload { file, entrypoint } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("'{}' has no usable file name", file.display()))?
                .to_string();
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read '{}'", file.display()))?;

            let object = service
                .upload_model(&file_name, Bytes::from(content), entrypoint.as_deref())
                .await?;
            println!("✅ Uploaded {}", object.name);
            println!("🔗 urn: {}", object.urn);
        }
        Command::Status { urn } => {
            let status = service.translation_status(&urn).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
