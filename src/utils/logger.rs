use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

fn default_directive(verbose: bool, log_level: Option<&str>) -> String {
    match (verbose, log_level) {
        (true, _) => "llm_field_etl=debug,info".to_string(),
        (false, Some(level)) => format!("llm_field_etl={}", level),
        (false, None) => "llm_field_etl=info".to_string(),
    }
}

/// CLI 日誌：輸出到 stderr，stdout 留給 JSON Lines 結果
pub fn init_cli_logger(verbose: bool, log_level: Option<&str>) {
    let filter = build_filter(&default_directive(verbose, log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON 日誌：同樣遵守 verbose 與 runtime.log_level
pub fn init_json_logger(verbose: bool, log_level: Option<&str>) {
    let filter = build_filter(&default_directive(verbose, log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(), // 給集中式日誌收集使用
        )
        .init();
}
