use crate::domain::model::Record;
use crate::utils::error::{EtlError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// 讀取 JSON Lines，空白行略過
pub async fn read_json_lines<R: AsyncBufRead + Unpin>(reader: R) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record = Record::from_json_line(&line).map_err(|e| EtlError::ProcessingError {
            message: format!("line {}: {}", line_no, e),
        })?;
        records.push(record);
    }

    tracing::debug!("📂 Read {} records", records.len());
    Ok(records)
}

pub async fn write_json_lines<W: AsyncWrite + Unpin>(
    writer: &mut W,
    records: &[Record],
) -> Result<()> {
    for record in records {
        let mut line = record.to_json_line()?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}
