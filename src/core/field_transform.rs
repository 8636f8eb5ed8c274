use crate::adapters::drivers::build_driver;
use crate::config::processor::ProcessorConfig;
use crate::core::prompt::PromptBuilder;
use crate::domain::model::{Record, Value};
use crate::domain::ports::{Driver, MetricCounter, RecordProcessor};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 取出來源欄位、詢問模型、把回答寫入目標欄位
///
/// 任何後端失敗都原封不動回傳記錄，不會讓宿主 pipeline 看到錯誤。
pub struct FieldTransform {
    source_field: String,
    target_field: String,
    instruction: String,
    prompt_builder: PromptBuilder,
    driver: Arc<dyn Driver>,
    counter: Arc<dyn MetricCounter>,
}

impl FieldTransform {
    pub fn new(
        source_field: impl Into<String>,
        target_field: impl Into<String>,
        instruction: impl Into<String>,
        prompt_builder: PromptBuilder,
        driver: Arc<dyn Driver>,
        counter: Arc<dyn MetricCounter>,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            instruction: instruction.into(),
            prompt_builder,
            driver,
            counter,
        }
    }

    pub fn with_driver(
        config: &ProcessorConfig,
        driver: Arc<dyn Driver>,
        counter: Arc<dyn MetricCounter>,
    ) -> Self {
        Self::new(
            config.source_field(),
            config.target_field(),
            config.instruction(),
            PromptBuilder::new(config.prompt_template()),
            driver,
            counter,
        )
    }

    /// 依設定建立後端；設定錯誤在這裡就會失敗
    pub fn from_config(config: &ProcessorConfig, counter: Arc<dyn MetricCounter>) -> Result<Self> {
        let driver = build_driver(config)?;
        Ok(Self::with_driver(config, driver, counter))
    }

    pub fn source_field(&self) -> &str {
        &self.source_field
    }

    pub fn target_field(&self) -> &str {
        &self.target_field
    }

    pub async fn transform(&self, record: Record, cancel: &CancellationToken) -> Record {
        let prompt = match record.get(&self.source_field) {
            Some(value) => self.prompt_builder.build(value, &self.instruction),
            None => {
                tracing::debug!(
                    "⏭️ Field '{}' not present, passing record through",
                    self.source_field
                );
                return record;
            }
        };

        match self.driver.ask(&prompt, cancel).await {
            Ok(text) => {
                self.counter.incr(1);
                tracing::debug!(
                    "✅ {} answered, writing {} chars to '{}'",
                    self.driver.name(),
                    text.len(),
                    self.target_field
                );
                let mut output = record;
                output.insert(self.target_field.clone(), Value::String(text));
                output
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {} request failed, passing record through unchanged: {}",
                    self.driver.name(),
                    e
                );
                record
            }
        }
    }
}

#[async_trait]
impl RecordProcessor for FieldTransform {
    async fn process(&self, record: Record, cancel: &CancellationToken) -> Result<Vec<Record>> {
        Ok(vec![self.transform(record, cancel).await])
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
