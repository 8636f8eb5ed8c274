// Domain layer: record model and ports (driver, metrics, processor lifecycle).

pub mod model;
pub mod ports;
