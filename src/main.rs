use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error};

use shortlinker_insights::cli::{Cli, Commands};
use shortlinker_insights::config::init_config;
use shortlinker_insights::runtime::{self, startup::generate_config};
use shortlinker_insights::system::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 生成配置不依赖现有配置
    if let Commands::GenerateConfig { output_path, force } = &cli.command {
        if let Err(e) = generate_config(output_path.as_deref(), *force) {
            eprintln!("{}", e.format_colored());
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    let config = match init_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            return ExitCode::FAILURE;
        }
    };
    // guard 需活到 main 返回，退出前刷新日志
    let _guard = init_logging(&config.logging);
    debug!("Configuration loaded from {}", cli.config);

    let ctx = match runtime::prepare_startup(&cli).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = runtime::run_command(&ctx, &cli.command).await {
        error!("Command failed: {}", e);
        eprintln!("{}", e.format_colored());
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
