pub mod engine;
pub mod field_transform;
pub mod prompt;

pub use crate::domain::model::{Record, Value};
pub use crate::domain::ports::{Driver, MetricCounter, RecordProcessor};
pub use crate::utils::error::Result;
