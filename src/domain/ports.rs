use crate::domain::model::Record;
use crate::utils::error::{DriverError, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// 語言模型後端的能力介面
#[async_trait]
pub trait Driver: Send + Sync {
    async fn ask(&self, prompt: &str, cancel: &CancellationToken)
        -> std::result::Result<String, DriverError>;

    fn name(&self) -> &'static str;
}

pub trait MetricCounter: Send + Sync {
    fn incr(&self, delta: u64);
}

/// 宿主 pipeline 對單筆記錄處理器的生命週期呼叫
#[async_trait]
pub trait RecordProcessor: Send + Sync {
    async fn process(&self, record: Record, cancel: &CancellationToken) -> Result<Vec<Record>>;

    async fn close(&self) -> Result<()>;
}
