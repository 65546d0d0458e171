use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::analytics::{EngineSettings, SystemClock};
use crate::cache::{CacheFactory, NullResultCache, ResultCache};
use crate::cli::{Cli, Commands};
use crate::config::{StaticConfig, get_config};
use crate::errors::InsightError;
use crate::services::{HeatmapScope, InsightService, QueryOptions};
use crate::storage::{ClickStore, MemoryClickStore, StorageFactory};

pub struct StartupContext {
    pub store: Arc<dyn ClickStore>,
    pub cache: Arc<dyn ResultCache>,
    pub service: Arc<InsightService>,
    pub options: QueryOptions,
}

/// 根据配置和命令行参数创建服务
pub async fn prepare_startup(cli: &Cli) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    let config = get_config().context("Configuration not initialized")?;

    let store: Arc<dyn ClickStore> = match &cli.seed {
        Some(path) => Arc::new(
            MemoryClickStore::from_json_file(path)
                .with_context(|| format!("Failed to load seed file {}", path))?,
        ),
        None => StorageFactory::create(&config.database)
            .await
            .context("Failed to create click store")?,
    };
    info!("Using click store backend: {}", store.backend_name());

    let cache: Arc<dyn ResultCache> = if cli.no_cache {
        Arc::new(NullResultCache::new())
    } else {
        CacheFactory::create(&config.cache)
    };
    info!("Using result cache backend: {}", cache.name());

    let service = Arc::new(InsightService::new(
        store.clone(),
        cache.clone(),
        Arc::new(SystemClock),
        EngineSettings::from(&config.analytics),
        config.cache.ttl.clone(),
    ));

    debug!("Startup completed in {:?}", start_time.elapsed());
    Ok(StartupContext {
        store,
        cache,
        service,
        options: QueryOptions {
            bypass_cache: cli.no_cache,
            sort_insights: false,
        },
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), InsightError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{}", rendered);
    Ok(())
}

/// 写出示例配置，不需要存储和缓存
pub fn generate_config(output_path: Option<&str>, force: bool) -> Result<(), InsightError> {
    let sample = StaticConfig::generate_sample_config();
    match output_path {
        None => {
            println!("{}", sample);
            Ok(())
        }
        Some(path) => {
            if Path::new(path).exists() && !force {
                return Err(InsightError::invalid_input(format!(
                    "{} already exists, use --force to overwrite",
                    path
                )));
            }
            std::fs::write(path, sample).map_err(|e| {
                InsightError::config(format!("Failed to write {}: {}", path, e))
            })?;
            info!("Example configuration written to {}", path);
            Ok(())
        }
    }
}

/// 执行查询命令，结果以 JSON 输出到 stdout
pub async fn run_command(ctx: &StartupContext, command: &Commands) -> Result<(), InsightError> {
    let service = &ctx.service;
    let options = ctx.options;
    match command {
        Commands::Report {
            link_id,
            sort_insights,
        } => {
            let options = QueryOptions {
                sort_insights: *sort_insights,
                ..options
            };
            print_json(&service.get_link_report(*link_id, options).await?)
        }
        Commands::Global { link_ids } => {
            print_json(&service.get_global_report(link_ids, options).await?)
        }
        Commands::Quality { link_id } => {
            print_json(&service.get_quality_report(*link_id, options).await?)
        }
        Commands::Heatmap { link_ids } => {
            let scope = match link_ids.as_slice() {
                [single] => HeatmapScope::Link(*single),
                _ => HeatmapScope::Links(link_ids.clone()),
            };
            print_json(&service.get_heatmap(scope, options).await?)
        }
        Commands::GenerateConfig {
            output_path,
            force,
        } => generate_config(output_path.as_deref(), *force),
    }
}
