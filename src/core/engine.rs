use crate::core::{Record, RecordProcessor};
use crate::utils::error::Result;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

#[derive(Debug, Clone)]
pub struct TransformSummary {
    pub records: Vec<Record>,
    pub input_count: usize,
    pub output_count: usize,
}

/// 以有限並發把每筆記錄交給處理器，輸出維持輸入順序
pub struct TransformEngine<P: RecordProcessor> {
    processor: P,
    concurrent_requests: usize,
}

impl<P: RecordProcessor> TransformEngine<P> {
    pub fn new(processor: P) -> Self {
        Self::with_concurrency(processor, DEFAULT_CONCURRENT_REQUESTS)
    }

    pub fn with_concurrency(processor: P, concurrent_requests: usize) -> Self {
        Self {
            processor,
            concurrent_requests: concurrent_requests.max(1),
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub async fn run(
        &self,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> Result<TransformSummary> {
        let input_count = records.len();
        tracing::info!(
            "🔄 Transforming {} records ({} concurrent requests)",
            input_count,
            self.concurrent_requests
        );

        let batches: Vec<Result<Vec<Record>>> = stream::iter(records)
            .map(|record| self.processor.process(record, cancel))
            .buffered(self.concurrent_requests)
            .collect()
            .await;

        let mut output = Vec::with_capacity(input_count);
        let mut first_error = None;
        for batch in batches {
            match batch {
                Ok(records) => output.extend(records),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        // 失敗時也要先釋放處理器
        let closed = self.processor.close().await;
        if let Some(e) = first_error {
            tracing::error!("❌ Transform run failed: {}", e);
            return Err(e);
        }
        closed?;

        if cancel.is_cancelled() {
            tracing::warn!("🛑 Run cancelled, remaining records were passed through");
        }
        tracing::info!("✅ Transformed {} records", output.len());

        Ok(TransformSummary {
            output_count: output.len(),
            records: output,
            input_count,
        })
    }
}
