use aps_simple_viewer::utils::error::{ErrorSeverity, ViewerError};
use aps_simple_viewer::utils::{logger, validation::Validate};
use aps_simple_viewer::{AppConfig, CliConfig};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    let resolved = AppConfig::resolve(&cli).and_then(|c| c.validate().map(|_| c));

    // 初始化日誌：設定載入失敗時退回命令列旗標
    let (verbose, json_logs) = match &resolved {
        Ok(config) => (config.verbose, config.json_logs),
        Err(_) => (cli.verbose, cli.json_logs),
    };
    logger::init_logger(verbose, json_logs);

    tracing::info!("🚀 Starting aps-simple-viewer");

    let config = match resolved {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    if let Some(path) = &cli.config {
        tracing::info!("📄 Loaded configuration from {}", path);
    }
    if config.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    if let Err(e) = aps_simple_viewer::app::serve(&config).await {
        tracing::error!(
            "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(error: &ViewerError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}
