use crate::domain::ports::MetricCounter;
use std::sync::atomic::{AtomicU64, Ordering};

/// 行程內的單調遞增計數器
#[derive(Debug)]
pub struct AtomicCounter {
    name: String,
    value: AtomicU64,
}

impl AtomicCounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl MetricCounter for AtomicCounter {
    fn incr(&self, delta: u64) {
        let total = self.value.fetch_add(delta, Ordering::Relaxed) + delta;
        tracing::trace!("📊 {} = {}", self.name, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let counter = Arc::new(AtomicCounter::new("open_ai_request"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.incr(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.value(), 8000);
        assert_eq!(counter.name(), "open_ai_request");
    }
}
