// Adapters layer: concrete language-model backends, metrics sinks and record I/O.

pub mod drivers;
pub mod jsonl;
pub mod metrics;
