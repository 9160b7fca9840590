use crate::config::SimulationConfig;
use crate::data_structures::{bytes_to_gib, CostBreakdown, DAYS_PER_MONTH};
use crate::error::{Result, SimulationError};
use crate::ledger::GenerationLedger;
use crate::policy::CostEvent;
use crate::pricing::PricingTable;

/// Prices a month of ledger state and policy events. Knows nothing about
/// which policy produced them.
pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }

    /// Full-month storage for every resident byte, ingestion month included.
    pub fn calculate_storage_cost(&self, ledger: &GenerationLedger, pricing: &PricingTable) -> f64 {
        ledger
            .bytes_by_class()
            .iter()
            .map(|(class, bytes)| bytes_to_gib(bytes) * pricing.tier(class).storage())
            .sum()
    }

    pub fn calculate_retrieval_cost(&self, events: &[CostEvent], pricing: &PricingTable) -> f64 {
        events
            .iter()
            .map(|event| match event {
                CostEvent::Retrieval { class, bytes } => {
                    bytes_to_gib(*bytes) * pricing.tier(*class).retrieval()
                }
                _ => 0.0,
            })
            .sum()
    }

    /// Early-deletion rates are per GiB-month, so remaining days are
    /// converted to months.
    pub fn calculate_early_deletion_cost(&self, events: &[CostEvent], pricing: &PricingTable) -> f64 {
        events
            .iter()
            .map(|event| match event {
                CostEvent::EarlyDeletion {
                    class,
                    bytes,
                    remaining_days,
                } => {
                    bytes_to_gib(*bytes) * pricing.tier(*class).early_deletion() * remaining_days
                        / DAYS_PER_MONTH
                }
                _ => 0.0,
            })
            .sum()
    }

    pub fn calculate_class_a_cost(
        &self,
        events: &[CostEvent],
        config: &SimulationConfig,
        pricing: &PricingTable,
    ) -> f64 {
        let event_operations: f64 = events.iter().map(|event| event.class_a_operations()).sum();
        (config.operations.class_a + event_operations) * pricing.operations().class_a()
    }

    pub fn calculate_class_b_cost(&self, config: &SimulationConfig, pricing: &PricingTable) -> f64 {
        config.operations.class_b * pricing.operations().class_b()
    }

    pub fn calculate_management_fee(&self, events: &[CostEvent], pricing: &PricingTable) -> f64 {
        self.managed_objects(events) / 1000.0 * pricing.management_fee_per_1000_objects()
    }

    /// Object-equivalents the events put under management this month.
    pub fn managed_objects(&self, events: &[CostEvent]) -> f64 {
        events
            .iter()
            .map(|event| match event {
                CostEvent::ManagedObjects { count } => *count,
                _ => 0.0,
            })
            .sum()
    }

    /// Itemised cost of `month`. Fails if any component is not finite.
    pub fn accrue(
        &self,
        month: u32,
        ledger: &GenerationLedger,
        events: &[CostEvent],
        config: &SimulationConfig,
        pricing: &PricingTable,
    ) -> Result<CostBreakdown> {
        let costs = CostBreakdown::new(
            self.calculate_storage_cost(ledger, pricing),
            self.calculate_retrieval_cost(events, pricing),
            self.calculate_early_deletion_cost(events, pricing),
            self.calculate_class_a_cost(events, config, pricing),
            self.calculate_class_b_cost(config, pricing),
            self.calculate_management_fee(events, pricing),
        );

        if costs.is_finite() {
            Ok(costs)
        } else {
            Err(SimulationError::numeric(month, "monthly cost"))
        }
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Neumaier-compensated running sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostAccumulator {
    sum: f64,
    compensation: f64,
}

impl CostAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }
}
