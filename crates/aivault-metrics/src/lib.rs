use std::sync::Arc;

use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Debug)]
pub struct MetricsRegistry {
    pub transactions: Arc<TransactionMetrics>,
    pub executions: Arc<ExecutionMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            transactions: TransactionMetrics::new(),
            executions: ExecutionMetrics::new(),
        })
    }
}

#[derive(Debug)]
pub struct TransactionMetrics {
    submitted: Counter<u64>,
}

impl TransactionMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("aivault-api");
        let submitted = meter
            .u64_counter("vault_transactions_submitted_total")
            .with_description("Number of transactions broadcast to the vault manager")
            .with_unit("count")
            .init();

        Arc::new(Self { submitted })
    }

    pub fn record_submitted(&self, operation: &str) {
        self.submitted
            .add(1, &[KeyValue::new("operation", operation.to_string())]);
    }
}

#[derive(Debug)]
pub struct ExecutionMetrics {
    finished: Counter<u64>,
}

impl ExecutionMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("aivault-api");
        let finished = meter
            .u64_counter("strategy_executions_finished_total")
            .with_description("Number of executions that reached a terminal status")
            .with_unit("count")
            .init();

        Arc::new(Self { finished })
    }

    pub fn record_finished(&self, kind: ExecutionKindLabel, status: &str) {
        self.finished.add(
            1,
            &[
                KeyValue::new("kind", kind.as_str()),
                KeyValue::new("status", status.to_string()),
            ],
        );
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ExecutionKindLabel {
    Strategy,
    WithdrawAll,
}

impl ExecutionKindLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::WithdrawAll => "withdraw_all",
        }
    }
}
