//! Prometheus metrics for the faucet

use crate::database::FaucetStatistics;
use crate::error::{FaucetError, FaucetResult};
use drip_common::types::UNIT;
use drip_common::Amount;
use prometheus::{opts, Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct FaucetMetrics {
    registry: Registry,
    pub claims_total: IntCounter,
    pub claims_rejected_total: IntCounterVec,
    pub tokens_dispensed: Gauge,
    pub total_supply: Gauge,
    pub paused: IntGauge,
}

impl FaucetMetrics {
    pub fn new() -> FaucetResult<Self> {
        let registry = Registry::new();

        let claims_total = IntCounter::with_opts(opts!(
            "drip_claims_total",
            "Total number of successful faucet claims"
        ))
        .map_err(metrics_error)?;

        let claims_rejected_total = IntCounterVec::new(
            opts!("drip_claims_rejected_total", "Rejected faucet claims by reason"),
            &["reason"],
        )
        .map_err(metrics_error)?;

        let tokens_dispensed = Gauge::with_opts(opts!(
            "drip_tokens_dispensed",
            "Whole tokens minted through the faucet since start"
        ))
        .map_err(metrics_error)?;

        let total_supply = Gauge::with_opts(opts!(
            "drip_total_supply",
            "Current total token supply in whole tokens"
        ))
        .map_err(metrics_error)?;

        let paused = IntGauge::with_opts(opts!("drip_paused", "1 while the faucet is paused"))
            .map_err(metrics_error)?;

        registry.register(Box::new(claims_total.clone())).map_err(metrics_error)?;
        registry.register(Box::new(claims_rejected_total.clone())).map_err(metrics_error)?;
        registry.register(Box::new(tokens_dispensed.clone())).map_err(metrics_error)?;
        registry.register(Box::new(total_supply.clone())).map_err(metrics_error)?;
        registry.register(Box::new(paused.clone())).map_err(metrics_error)?;

        Ok(Self {
            registry,
            claims_total,
            claims_rejected_total,
            tokens_dispensed,
            total_supply,
            paused,
        })
    }

    pub fn record_claim(&self, amount: Amount, total_supply: Amount) {
        self.claims_total.inc();
        self.tokens_dispensed.add(whole_tokens(amount));
        self.total_supply.set(whole_tokens(total_supply));
    }

    /// Seed counters from a restored journal so a restarted process reports totals
    pub fn restore(&self, stats: &FaucetStatistics, total_supply: Amount, paused: bool) {
        self.claims_total.inc_by(stats.total_claims);
        self.tokens_dispensed.set(whole_tokens(stats.total_dispensed));
        self.total_supply.set(whole_tokens(total_supply));
        self.set_paused(paused);
    }

    pub fn record_rejection(&self, err: &FaucetError) {
        self.claims_rejected_total
            .with_label_values(&[err.kind().code()])
            .inc();
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.set(paused as i64);
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather(&self) -> FaucetResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| FaucetError::Serialization(e.to_string()))
    }
}

fn whole_tokens(amount: Amount) -> f64 {
    amount as f64 / UNIT as f64
}

fn metrics_error(err: prometheus::Error) -> FaucetError {
    FaucetError::Config(format!("metrics: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_rejection_counters() {
        let metrics = FaucetMetrics::new().unwrap();
        metrics.record_claim(10 * UNIT, 10 * UNIT);
        metrics.record_claim(10 * UNIT, 20 * UNIT);
        metrics.record_rejection(&FaucetError::FaucetPaused);
        metrics.set_paused(true);

        assert_eq!(metrics.claims_total.get(), 2);
        assert_eq!(metrics.tokens_dispensed.get(), 20.0);
        assert_eq!(metrics.total_supply.get(), 20.0);
        assert_eq!(
            metrics.claims_rejected_total.with_label_values(&["FAUCET_PAUSED"]).get(),
            1
        );

        let text = metrics.gather().unwrap();
        assert!(text.contains("drip_claims_total 2"));
        assert!(text.contains("drip_paused 1"));
    }

    #[test]
    fn test_restore_from_statistics() {
        let metrics = FaucetMetrics::new().unwrap();
        let stats = FaucetStatistics {
            total_claims: 3,
            unique_claimants: 2,
            total_dispensed: 30 * UNIT,
        };
        metrics.restore(&stats, 45 * UNIT, false);

        assert_eq!(metrics.claims_total.get(), 3);
        assert_eq!(metrics.tokens_dispensed.get(), 30.0);
        assert_eq!(metrics.total_supply.get(), 45.0);
        assert_eq!(metrics.paused.get(), 0);
    }
}
