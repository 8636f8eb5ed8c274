use clap::Parser;
use llm_field_etl::adapters::jsonl::{read_json_lines, write_json_lines};
use llm_field_etl::config::processor::mask_secret;
use llm_field_etl::utils::error::ErrorSeverity;
use llm_field_etl::utils::{logger, validation::Validate};
use llm_field_etl::{
    AtomicCounter, CliConfig, EtlError, FieldTransform, ProcessorConfig, TomlConfig,
    TransformEngine,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose, config.log_level());
    } else {
        logger::init_cli_logger(args.verbose, config.log_level());
    }
    tracing::info!("🚀 Starting {}", config.pipeline_name());

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    let processor_config = config.processor_config()?;

    if args.dry_run {
        display_config_summary(&config, &processor_config, &args);
        return Ok(());
    }

    match run(&args, &config, &processor_config).await {
        Ok(count) => {
            tracing::info!("✅ Processed {} records", count);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(
    args: &CliConfig,
    config: &TomlConfig,
    processor_config: &ProcessorConfig,
) -> Result<usize, EtlError> {
    let counter = Arc::new(AtomicCounter::new(processor_config.metric_name()));
    let transform = FieldTransform::from_config(processor_config, counter.clone())?;
    let concurrency = args
        .concurrent_requests
        .unwrap_or_else(|| config.concurrent_requests());
    let engine = TransformEngine::with_concurrency(transform, concurrency);

    // Ctrl-C 取消進行中的請求，記錄照樣輸出
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, cancelling in-flight requests");
            signal_token.cancel();
        }
    });

    let records = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            read_json_lines(BufReader::new(file)).await?
        }
        None => read_json_lines(BufReader::new(tokio::io::stdin())).await?,
    };

    let summary = engine.run(records, &cancel).await?;

    match &args.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path).await?;
            write_json_lines(&mut file, &summary.records).await?;
            tracing::info!("📁 Output saved to: {}", path);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            write_json_lines(&mut stdout, &summary.records).await?;
        }
    }

    tracing::info!(
        "📊 {} = {} (input records: {})",
        counter.name(),
        counter.value(),
        summary.input_count
    );
    Ok(summary.output_count)
}

fn display_config_summary(config: &TomlConfig, processor: &ProcessorConfig, args: &CliConfig) {
    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline_name());
    println!(
        "  Field: {} -> {}",
        processor.source_field(),
        processor.target_field()
    );
    println!("  Instruction: {}", processor.instruction());
    println!("  Template: {}", processor.prompt_template());
    println!("  Driver: {} (model: {})", processor.driver_kind(), processor.model());
    println!("  API Key: {}", mask_secret(processor.api_key()));
    if let Some(endpoint) = processor.api_endpoint() {
        println!("  API Endpoint: {}", endpoint);
    }
    if let Some(url) = processor.api_url() {
        println!("  API URL: {}", url);
    }
    if let Some(timeout) = processor.request_timeout() {
        println!("  Request Timeout: {:?}", timeout);
    }
    println!(
        "  Concurrent Requests: {}",
        args.concurrent_requests
            .unwrap_or_else(|| config.concurrent_requests())
    );
    println!("  Metric: {}", processor.metric_name());
    println!("  🔍 DRY RUN MODE - no requests were sent");
}
