use crate::calculator::{Calculator, CostAccumulator};
use crate::config::{GrowthModel, SimulationConfig};
use crate::data_structures::{
    MonthlyResult, SimulationRun, SimulationWarning, StorageClass, Strategy,
};
use crate::error::{Result, SimulationError};
use crate::ledger::GenerationLedger;
use crate::policy::{policy_for, TransitionPolicy};
use crate::pricing::PricingTable;
use chrono::{Months, NaiveDate};
use tracing::{debug, info, warn};

/// Bytes ingested each month, computed once so every policy sees the same
/// arrivals.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionSchedule {
    amounts: Vec<f64>,
    warnings: Vec<SimulationWarning>,
}

impl IngestionSchedule {
    /// Month 1 ingests the initial data. Later months follow the growth
    /// model, with percentage growth applied to the previous month's total.
    /// Stops early if the amounts stop being finite.
    pub fn build(config: &SimulationConfig) -> Self {
        let mut amounts = Vec::with_capacity(config.horizon_months as usize);
        let mut warnings = Vec::new();
        let mut total = 0.0;

        for month in 1..=config.horizon_months {
            let amount = if month == 1 {
                config.initial_bytes
            } else {
                match config.growth {
                    GrowthModel::None => 0.0,
                    GrowthModel::Percentage { monthly_rate } => total * monthly_rate,
                    GrowthModel::Fixed { bytes_per_month } => bytes_per_month,
                }
            };

            if !(amount.is_finite() && (total + amount).is_finite()) {
                warn!(month, "ingestion overflowed, truncating the horizon");
                warnings.push(SimulationWarning::NumericOverflow {
                    month,
                    quantity: "ingested bytes".to_string(),
                });
                break;
            }

            total += amount;
            amounts.push(amount);
        }

        Self { amounts, warnings }
    }

    /// Bytes arriving in `month` (1-based), if the schedule reaches it.
    pub fn amount(&self, month: u32) -> Option<f64> {
        let index = (month as usize).checked_sub(1)?;
        self.amounts.get(index).copied()
    }

    pub fn months(&self) -> u32 {
        self.amounts.len() as u32
    }

    pub fn total(&self) -> f64 {
        self.amounts.iter().sum()
    }

    pub fn warnings(&self) -> &[SimulationWarning] {
        &self.warnings
    }

    pub fn is_truncated(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Runs one policy over the configured horizon.
pub struct Simulator {
    config: SimulationConfig,
    pricing: PricingTable,
    calculator: Calculator,
}

impl Simulator {
    /// Validates every input up front; nothing is simulated on error.
    pub fn new(config: SimulationConfig, pricing: PricingTable) -> Result<Self> {
        config.validate()?;
        pricing.validate()?;
        config.lifecycle.validate()?;

        Ok(Self {
            config,
            pricing,
            calculator: Calculator::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn schedule(&self) -> IngestionSchedule {
        IngestionSchedule::build(&self.config)
    }

    pub fn run(&self, strategy: Strategy) -> Result<SimulationRun> {
        let policy = policy_for(strategy, &self.config, &self.pricing)?;
        Ok(self.run_with_schedule(policy.as_ref(), &self.schedule()))
    }

    pub fn run_with_schedule(
        &self,
        policy: &dyn TransitionPolicy,
        schedule: &IngestionSchedule,
    ) -> SimulationRun {
        let config = &self.config;
        info!(
            strategy = %policy.strategy(),
            months = config.horizon_months,
            region = self.pricing.region(),
            "starting simulation run"
        );

        let mut ledger = GenerationLedger::new();
        let mut cumulative = CostAccumulator::new();
        let mut rows = Vec::with_capacity(config.horizon_months as usize);
        let mut warnings = schedule.warnings().to_vec();
        let mut truncated = schedule.is_truncated();

        for month in 1..=config.horizon_months {
            let Some(ingested) = schedule.amount(month) else {
                break;
            };

            ledger.advance_age();
            ledger.create(month, ingested, config.large_object_fraction);

            let mut events = policy.evaluate_month(month, &mut ledger, config);
            ledger.merge_where(|a, b| policy.interchangeable(a, b));
            events.extend(policy.cost_events_for_month(&ledger, config));

            let accrued = self
                .calculator
                .accrue(month, &ledger, &events, config, &self.pricing)
                .and_then(|costs| {
                    cumulative.add(costs.total());
                    if cumulative.total().is_finite() {
                        Ok(costs)
                    } else {
                        Err(SimulationError::numeric(month, "cumulative cost"))
                    }
                });
            let costs = match accrued {
                Ok(costs) => costs,
                Err(err) => {
                    warn!(strategy = %policy.strategy(), "{}", err);
                    warnings.push(overflow_warning(err, month));
                    truncated = true;
                    break;
                }
            };

            let reconciled_bytes = ledger.prune(config.negligible_fraction * ledger.total_bytes());

            let tiers = ledger.bytes_by_class();
            let eligible = ledger.eligible_bytes();
            let pinned = ledger.pinned_bytes();
            let row = MonthlyResult {
                month,
                period: period_for(config.start_date, month),
                standard_bytes: tiers[StorageClass::Standard],
                nearline_bytes: tiers[StorageClass::Nearline],
                coldline_bytes: tiers[StorageClass::Coldline],
                archive_bytes: tiers[StorageClass::Archive],
                total_bytes: tiers.total(),
                ingested_bytes: ingested,
                total_cost: costs.total(),
                costs,
                cumulative_cost: cumulative.total(),
                managed_objects: self.calculator.managed_objects(&events),
                total_objects: eligible / config.avg_large_object_bytes
                    + pinned / config.avg_small_object_bytes,
                transitioned_bytes: events.iter().map(|event| event.moved_bytes()).sum(),
                reconciled_bytes,
                generation_count: ledger.len(),
            };

            debug!(
                strategy = %policy.strategy(),
                month,
                total_bytes = row.total_bytes,
                total_cost = row.total_cost,
                generations = row.generation_count,
                "month simulated"
            );
            rows.push(row);
        }

        if truncated {
            warn!(
                strategy = %policy.strategy(),
                months = rows.len(),
                "simulation truncated"
            );
        }
        info!(
            strategy = %policy.strategy(),
            months = rows.len(),
            total_cost = cumulative.total(),
            "simulation run finished"
        );

        SimulationRun::new(policy.strategy(), rows, warnings, truncated)
    }
}

fn period_for(start_date: Option<NaiveDate>, month: u32) -> Option<NaiveDate> {
    start_date?.checked_add_months(Months::new(month.saturating_sub(1)))
}

fn overflow_warning(err: SimulationError, month: u32) -> SimulationWarning {
    match err {
        SimulationError::Numeric { month, quantity } => {
            SimulationWarning::NumericOverflow { month, quantity }
        }
        SimulationError::Configuration { field, .. } => SimulationWarning::NumericOverflow {
            month,
            quantity: field,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessRates;
    use crate::data_structures::BYTES_PER_GIB;

    fn config() -> SimulationConfig {
        SimulationConfig {
            initial_bytes: 1024.0 * BYTES_PER_GIB,
            ..SimulationConfig::default()
        }
    }

    fn simulator(config: SimulationConfig) -> Simulator {
        Simulator::new(config, PricingTable::base()).unwrap()
    }

    #[test]
    fn test_schedule_percentage_growth_compounds() {
        let config = SimulationConfig {
            initial_bytes: 1000.0,
            growth: GrowthModel::Percentage { monthly_rate: 0.1 },
            ..SimulationConfig::default()
        };
        let schedule = IngestionSchedule::build(&config);

        assert_eq!(schedule.amount(1), Some(1000.0));
        assert_eq!(schedule.amount(2), Some(100.0));
        assert!((schedule.amount(3).unwrap() - 110.0).abs() < 1e-9);
        assert_eq!(schedule.amount(0), None);
        assert_eq!(schedule.months(), 12);
        assert!(!schedule.is_truncated());
    }

    #[test]
    fn test_schedule_fixed_growth() {
        let config = SimulationConfig {
            initial_bytes: 1000.0,
            growth: GrowthModel::Fixed {
                bytes_per_month: 50.0,
            },
            ..SimulationConfig::default()
        };
        let schedule = IngestionSchedule::build(&config);

        assert_eq!(schedule.amount(12), Some(50.0));
        assert_eq!(schedule.total(), 1000.0 + 11.0 * 50.0);
    }

    #[test]
    fn test_schedule_truncates_on_overflow() {
        let config = SimulationConfig {
            initial_bytes: 1e300,
            growth: GrowthModel::Percentage { monthly_rate: 1e10 },
            ..SimulationConfig::default()
        };
        let schedule = IngestionSchedule::build(&config);

        assert_eq!(schedule.months(), 1);
        assert!(schedule.is_truncated());
        assert_eq!(
            schedule.warnings()[0],
            SimulationWarning::NumericOverflow {
                month: 2,
                quantity: "ingested bytes".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_inputs_rejected_before_running() {
        let config = SimulationConfig {
            horizon_months: 3,
            ..SimulationConfig::default()
        };
        let err = Simulator::new(config, PricingTable::base()).err().unwrap();
        assert_eq!(err.field(), Some("horizon_months"));

        let pricing = PricingTable::base().without_tier(StorageClass::Nearline);
        let err = Simulator::new(SimulationConfig::default(), pricing)
            .err()
            .unwrap();
        assert_eq!(err.field(), Some("pricing.tiers.nearline"));
    }

    #[test]
    fn test_rows_cover_horizon() {
        let simulator = simulator(config());
        for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
            let run = simulator.run(strategy).unwrap();
            assert_eq!(run.rows().len(), 12);
            assert!(!run.is_truncated());
            assert_eq!(run.strategy(), strategy);
            for (index, row) in run.rows().iter().enumerate() {
                assert_eq!(row.month(), index as u32 + 1);
            }
        }
    }

    #[test]
    fn test_first_month_is_all_standard() {
        let run = simulator(config()).run(Strategy::Lifecycle).unwrap();
        let first = &run.rows()[0];

        assert_eq!(first.bytes_in(StorageClass::Standard), 1024.0 * BYTES_PER_GIB);
        assert!((first.costs().storage() - 1024.0 * 0.020).abs() < 1e-9);
        assert_eq!(first.transitioned_bytes(), 0.0);
    }

    #[test]
    fn test_bytes_conserved_without_growth() {
        let run = simulator(config()).run(Strategy::Autoclass).unwrap();
        let initial = 1024.0 * BYTES_PER_GIB;
        for row in run.rows() {
            assert!((row.total_bytes() - initial).abs() / initial < 1e-9);
        }
    }

    #[test]
    fn test_cumulative_cost_is_running_sum() {
        let config = SimulationConfig {
            access_rates: AccessRates::default().with_rate(StorageClass::Coldline, 0.05),
            ..config()
        };
        let run = simulator(config).run(Strategy::Lifecycle).unwrap();

        let mut sum = 0.0;
        for row in run.rows() {
            sum += row.total_cost();
            assert!((row.cumulative_cost() - sum).abs() < 1e-9);
        }
        assert_eq!(run.total_cost(), run.final_row().unwrap().cumulative_cost());
    }

    #[test]
    fn test_period_labels_follow_start_date() {
        let config = SimulationConfig {
            start_date: NaiveDate::from_ymd_opt(2025, 11, 1),
            ..config()
        };
        let run = simulator(config).run(Strategy::Autoclass).unwrap();

        assert_eq!(run.rows()[0].period(), NaiveDate::from_ymd_opt(2025, 11, 1));
        assert_eq!(run.rows()[2].period(), NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn test_overflowing_cost_truncates_run() {
        let pricing = PricingTable::base().with_tier(
            StorageClass::Standard,
            crate::pricing::TierRates::new(1e300, 0.0, 0.0, 0),
        );
        let config = SimulationConfig {
            initial_bytes: 1e300,
            ..SimulationConfig::default()
        };
        let run = Simulator::new(config, pricing)
            .unwrap()
            .run(Strategy::Lifecycle)
            .unwrap();

        assert!(run.is_truncated());
        assert!(run.rows().is_empty());
        assert_eq!(
            run.warnings(),
            &[SimulationWarning::NumericOverflow {
                month: 1,
                quantity: "monthly cost".to_string()
            }]
        );
    }

    #[test]
    fn test_generation_count_stays_bounded() {
        let config = SimulationConfig {
            horizon_months: 60,
            growth: GrowthModel::Percentage { monthly_rate: 0.05 },
            access_rates: AccessRates {
                standard: 0.1,
                nearline: 0.1,
                coldline: 0.1,
                archive: 0.1,
            },
            ..config()
        };
        let run = simulator(config).run(Strategy::Autoclass).unwrap();
        let final_row = run.final_row().unwrap();

        assert!(final_row.generation_count() <= 4 * 60);
    }

    #[test]
    fn test_pruning_reconciles_mass_into_surviving_generations() {
        let busy = |negligible_fraction: f64| SimulationConfig {
            horizon_months: 60,
            growth: GrowthModel::Percentage { monthly_rate: 0.05 },
            access_rates: AccessRates {
                standard: 0.1,
                nearline: 0.1,
                coldline: 0.1,
                archive: 0.1,
            },
            negligible_fraction,
            ..config()
        };
        let pruned = simulator(busy(1e-3)).run(Strategy::Autoclass).unwrap();
        let unpruned = simulator(busy(1e-6)).run(Strategy::Autoclass).unwrap();

        let reconciled: f64 = pruned.rows().iter().map(|row| row.reconciled_bytes()).sum();
        assert!(reconciled > 0.0);
        assert!(
            pruned.final_row().unwrap().generation_count()
                < unpruned.final_row().unwrap().generation_count()
        );

        let mut ingested = 0.0;
        for row in pruned.rows() {
            ingested += row.ingested_bytes();
            assert!((row.total_bytes() - ingested).abs() <= ingested * 1e-9);
        }
    }
}
