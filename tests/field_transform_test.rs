use anyhow::Result;
use httpmock::prelude::*;
use llm_field_etl::{AtomicCounter, FieldTransform, Record, RecordProcessor, TomlConfig};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn openai_config(base_url: &str, extra: &str) -> String {
    format!(
        r#"
[processor]
source_field = "text"
target_field = "summary"
prompt = "uppercase it"
driver = "openai"
api_key = "sk-integration"
model = "gpt-4o-mini"
api_endpoint = "{}"
{}
"#,
        base_url, extra
    )
}

fn build(toml_content: &str) -> Result<(FieldTransform, Arc<AtomicCounter>)> {
    let config = TomlConfig::from_toml_str(toml_content)?;
    let processor = config.processor_config()?;
    let counter = Arc::new(AtomicCounter::new(processor.metric_name()));
    let transform = FieldTransform::from_config(&processor, counter.clone())?;
    Ok((transform, counter))
}

/// {"text":"hello"} -> {"text":"hello","summary":"HELLO"}
#[tokio::test]
async fn test_openai_success_writes_target_field() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer sk-integration")
            .json_body(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{
                    "role": "user",
                    "content": "Please take this value hello and do the following. uppercase it"
                }]
            }));
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "HELLO"}}]
        }));
    });

    let (transform, counter) = build(&openai_config(&server.base_url(), ""))?;
    let input = Record::from_json_line(r#"{"text":"hello"}"#)?;
    let output = transform.process(input, &CancellationToken::new()).await?;

    api_mock.assert();
    assert_eq!(output.len(), 1);
    assert_eq!(
        output[0].to_json_line()?,
        r#"{"text":"hello","summary":"HELLO"}"#
    );
    assert_eq!(counter.value(), 1);
    Ok(())
}

#[tokio::test]
async fn test_absent_source_field_makes_no_call() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"content": "unused"}}]
        }));
    });

    let (transform, counter) = build(&openai_config(&server.base_url(), ""))?;
    let input = Record::from_json_line(r#"{"other":1}"#)?;
    let output = transform.process(input, &CancellationToken::new()).await?;

    api_mock.assert_hits(0);
    assert_eq!(output[0].to_json_line()?, r#"{"other":1}"#);
    assert_eq!(counter.value(), 0);
    Ok(())
}

#[tokio::test]
async fn test_backend_error_passes_record_through() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500).body("internal error");
    });

    let (transform, counter) = build(&openai_config(&server.base_url(), ""))?;
    let line = r#"{"text":"hello","summary":"previous","n":[1,2]}"#;
    let output = transform
        .process(Record::from_json_line(line)?, &CancellationToken::new())
        .await?;

    api_mock.assert();
    assert_eq!(output[0].to_json_line()?, line);
    assert_eq!(counter.value(), 0);
    Ok(())
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_request() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(serde_json::json!({"choices": [{"message": {"content": "late"}}]}));
    });

    let (transform, counter) = build(&openai_config(&server.base_url(), ""))?;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let input = Record::from_json_line(r#"{"text":"slow"}"#)?;
    let output = transform.process(input.clone(), &cancel).await?;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(output, vec![input]);
    assert_eq!(counter.value(), 0);
    Ok(())
}

#[tokio::test]
async fn test_request_timeout_passes_record_through() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(serde_json::json!({"choices": [{"message": {"content": "late"}}]}));
    });

    let (transform, counter) = build(&openai_config(
        &server.base_url(),
        "request_timeout_seconds = 1",
    ))?;
    let input = Record::from_json_line(r#"{"text":"slow"}"#)?;
    let output = transform.process(input.clone(), &CancellationToken::new()).await?;

    assert_eq!(output, vec![input]);
    assert_eq!(counter.value(), 0);
    Ok(())
}

#[tokio::test]
async fn test_azure_driver_end_to_end() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/openai/deployments/davinci-prod/completions")
            .query_param("api-version", "2023-05-15")
            .header("api-key", "azure-secret")
            .json_body_partial(r#"{"max_tokens": 2048}"#);
        then.status(200)
            .json_body(serde_json::json!({"choices": [{"text": "positive"}]}));
    });

    let toml_content = format!(
        r#"
[processor]
source_field = "review"
target_field = "sentiment"
prompt = "classify the sentiment"
prompt_template = "quoted"
driver = "azure"
api_key = "azure-secret"
model = "davinci-prod"
api_endpoint = "{}"
"#,
        server.base_url()
    );

    let (transform, counter) = build(&toml_content)?;
    let input = Record::from_json_line(r#"{"id":7,"review":"great product"}"#)?;
    let output = transform.process(input, &CancellationToken::new()).await?;

    api_mock.assert();
    assert_eq!(
        output[0].to_json_line()?,
        r#"{"id":7,"review":"great product","sentiment":"positive"}"#
    );
    assert_eq!(counter.value(), 1);
    Ok(())
}

#[tokio::test]
async fn test_legacy_http_driver_end_to_end() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/completions")
            .header("authorization", "Bearer legacy")
            .json_body(serde_json::json!({
                "model": "text-davinci-003",
                "prompt": "Please take this value 41 and do the following. add one",
                "max_tokens": 5,
                "temperature": 0
            }));
        then.status(200)
            .json_body(serde_json::json!({"choices": [{"text": "42"}]}));
    });

    let toml_content = format!(
        r#"
[processor]
source_field = "n"
target_field = "n_plus_one"
prompt = "add one"
driver = "legacy_http"
api_url = "{}"
api_key = "legacy"
model = "text-davinci-003"
metric_name = "legacy_requests"
"#,
        server.url("/v1/completions")
    );

    let (transform, counter) = build(&toml_content)?;
    let input = Record::from_json_line(r#"{"n":41}"#)?;
    let output = transform.process(input, &CancellationToken::new()).await?;

    api_mock.assert();
    assert_eq!(output[0].to_json_line()?, r#"{"n":41,"n_plus_one":"42"}"#);
    assert_eq!(counter.name(), "legacy_requests");
    assert_eq!(counter.value(), 1);
    Ok(())
}
