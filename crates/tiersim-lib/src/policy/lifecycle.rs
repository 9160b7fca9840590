use super::{CostEvent, TransitionPolicy};
use crate::config::{LifecycleRules, SimulationConfig};
use crate::data_structures::{StorageClass, Strategy, DAYS_PER_MONTH};
use crate::error::Result;
use crate::ledger::GenerationLedger;
use crate::pricing::PricingTable;

/// Age-driven, one-directional tiering. Classes follow creation age only;
/// reads are billed but never move data.
#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    rules: LifecycleRules,
    min_storage_days: [u32; 4],
}

impl LifecyclePolicy {
    pub fn new(rules: LifecycleRules, pricing: &PricingTable) -> Result<Self> {
        rules.validate()?;

        let min_storage_days =
            StorageClass::ALL.map(|class| pricing.tier(class).min_storage_days());

        Ok(Self {
            rules,
            min_storage_days,
        })
    }

    pub fn rules(&self) -> &LifecycleRules {
        &self.rules
    }

    /// Days of `class`'s minimum duration still unexpired after
    /// `class_age` months in it.
    pub fn remaining_min_days(&self, class: StorageClass, class_age: u32) -> f64 {
        let elapsed = class_age as f64 * DAYS_PER_MONTH;
        (self.min_storage_days[class.coldness()] as f64 - elapsed).max(0.0)
    }
}

impl TransitionPolicy for LifecyclePolicy {
    fn strategy(&self) -> Strategy {
        Strategy::Lifecycle
    }

    fn evaluate_month(
        &self,
        month: u32,
        ledger: &mut GenerationLedger,
        config: &SimulationConfig,
    ) -> Vec<CostEvent> {
        let mut events = Vec::new();

        for id in ledger.ids() {
            let Some(generation) = ledger.get_mut(id) else {
                continue;
            };
            if !generation.is_eligible() {
                continue;
            }

            let target = self.rules.class_for_age(generation.age_at(month));
            if target.is_colder_than(generation.class()) {
                let from = generation.class();
                generation.move_to(target);
                events.push(CostEvent::Transition {
                    generation: id,
                    from,
                    to: target,
                    bytes: generation.bytes(),
                    class_a_operations: generation.bytes() / config.avg_large_object_bytes,
                });
            }

            let class = generation.class();
            let accessed = generation.bytes() * config.access_rates.rate(class);
            if accessed <= 0.0 {
                continue;
            }

            events.push(CostEvent::Retrieval {
                class,
                bytes: accessed,
            });

            let remaining_days = self.remaining_min_days(class, generation.class_age());
            if remaining_days > 0.0 {
                events.push(CostEvent::EarlyDeletion {
                    class,
                    bytes: accessed,
                    remaining_days,
                });
            }
        }

        events
    }
}
