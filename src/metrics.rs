use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// Successful ledger operations by kind (purchase, assignment,
    /// transfer_initiate, transfer_complete, transfer_cancel)
    pub static ref LEDGER_OPERATIONS: IntCounterVec = {
        let counter = IntCounterVec::new(
            Opts::new(
                "garrison_ledger_operations_total",
                "Total number of committed ledger operations",
            ),
            &["operation"],
        )
        .expect("metric can be created");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric can be registered");
        counter
    };

    /// Rejected/failed ledger operations by kind and failure class
    pub static ref LEDGER_FAILURES: IntCounterVec = {
        let counter = IntCounterVec::new(
            Opts::new(
                "garrison_ledger_failures_total",
                "Total number of rejected or failed ledger operations",
            ),
            &["operation", "error_type"],
        )
        .expect("metric can be created");
        REGISTRY
            .register(Box::new(counter.clone()))
            .expect("metric can be registered");
        counter
    };
}

/// Render all registered metrics in the Prometheus text exposition format
pub fn gather() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_render() {
        LEDGER_OPERATIONS.with_label_values(&["purchase"]).inc();
        LEDGER_FAILURES
            .with_label_values(&["assignment", "insufficient_inventory"])
            .inc();

        let body = gather().unwrap();
        assert!(body.contains("garrison_ledger_operations_total"));
        assert!(body.contains("garrison_ledger_failures_total"));
    }
}
