use super::{CostEvent, TransitionPolicy};
use crate::config::{AutoclassParams, SimulationConfig};
use crate::data_structures::{months_for_days, Generation, StorageClass, Strategy};
use crate::error::{Result, SimulationError};
use crate::ledger::GenerationLedger;

/// Idle days after which Autoclass demotes to each class.
const IDLE_THRESHOLDS: [(StorageClass, u32); 3] = [
    (StorageClass::Nearline, 30),
    (StorageClass::Coldline, 90),
    (StorageClass::Archive, 365),
];

/// Access-driven, reversible tiering. Idle data cools down one class at a
/// time; any access sends the accessed share straight back to Standard.
#[derive(Debug, Clone)]
pub struct AutoclassPolicy {
    terminal_class: StorageClass,
}

impl AutoclassPolicy {
    pub fn new(params: AutoclassParams) -> Result<Self> {
        if params.terminal_class == StorageClass::Standard {
            return Err(SimulationError::configuration(
                "autoclass.terminal_class",
                "must be nearline, coldline or archive",
            ));
        }
        Ok(Self {
            terminal_class: params.terminal_class,
        })
    }

    pub fn terminal_class(&self) -> StorageClass {
        self.terminal_class
    }

    /// Class for bytes idle for `idle_months`.
    pub fn class_for_idle(&self, idle_months: u32) -> StorageClass {
        IDLE_THRESHOLDS
            .iter()
            .take_while(|(class, _)| !class.is_colder_than(self.terminal_class))
            .filter(|(_, days)| idle_months >= months_for_days(*days))
            .map(|(class, _)| *class)
            .last()
            .unwrap_or(StorageClass::Standard)
    }

    /// Re-promotion from the two coldest classes costs a Class A operation
    /// per object.
    fn repromotion_is_billed(from: StorageClass) -> bool {
        matches!(from, StorageClass::Coldline | StorageClass::Archive)
    }
}

impl TransitionPolicy for AutoclassPolicy {
    fn strategy(&self) -> Strategy {
        Strategy::Autoclass
    }

    fn evaluate_month(
        &self,
        _month: u32,
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

            let target = self.class_for_idle(generation.idle_age());
            if target.is_colder_than(generation.class()) {
                let from = generation.class();
                generation.move_to(target);
                events.push(CostEvent::Transition {
                    generation: id,
                    from,
                    to: target,
                    bytes: generation.bytes(),
                    class_a_operations: 0.0,
                });
            }

            let class = generation.class();
            let access_rate = config.access_rates.rate(class);
            if access_rate <= 0.0 {
                continue;
            }

            let Some(promoted_id) = ledger.split(id, access_rate) else {
                continue;
            };
            let Some(promoted) = ledger.get_mut(promoted_id) else {
                continue;
            };
            promoted.repromote();

            if class != StorageClass::Standard {
                let bytes = promoted.bytes();
                let objects = bytes / config.avg_large_object_bytes;
                events.push(CostEvent::Repromotion {
                    generation: promoted_id,
                    from: class,
                    bytes,
                    class_a_operations: if Self::repromotion_is_billed(class) {
                        objects
                    } else {
                        0.0
                    },
                });
            }
        }

        events
    }

    fn cost_events_for_month(
        &self,
        ledger: &GenerationLedger,
        config: &SimulationConfig,
    ) -> Vec<CostEvent> {
        let eligible = ledger.eligible_bytes();
        if eligible <= 0.0 {
            return Vec::new();
        }
        vec![CostEvent::ManagedObjects {
            count: eligible / config.avg_large_object_bytes,
        }]
    }

    /// Autoclass decisions depend only on idle age, so creation month does
    /// not matter.
    fn interchangeable(&self, a: &Generation, b: &Generation) -> bool {
        if a.is_eligible() != b.is_eligible() {
            return false;
        }
        if !a.is_eligible() {
            return a.class() == b.class();
        }
        a.class() == b.class()
            && a.class_age() == b.class_age()
            && a.idle_age() == b.idle_age()
            && a.was_promoted() == b.was_promoted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessRates;

    fn policy(terminal_class: StorageClass) -> AutoclassPolicy {
        AutoclassPolicy::new(AutoclassParams { terminal_class }).unwrap()
    }

    fn run_months(
        policy: &AutoclassPolicy,
        ledger: &mut GenerationLedger,
        config: &SimulationConfig,
        from: u32,
        to: u32,
    ) {
        for month in from..=to {
            ledger.advance_age();
            policy.evaluate_month(month, ledger, config);
        }
    }

    #[test]
    fn test_standard_terminal_rejected() {
        let err = AutoclassPolicy::new(AutoclassParams {
            terminal_class: StorageClass::Standard,
        })
        .unwrap_err();
        assert_eq!(err.field(), Some("autoclass.terminal_class"));
    }

    #[test]
    fn test_class_for_idle_respects_terminal() {
        let archive = policy(StorageClass::Archive);
        assert_eq!(archive.class_for_idle(0), StorageClass::Standard);
        assert_eq!(archive.class_for_idle(1), StorageClass::Nearline);
        assert_eq!(archive.class_for_idle(3), StorageClass::Coldline);
        assert_eq!(archive.class_for_idle(12), StorageClass::Archive);

        let nearline = policy(StorageClass::Nearline);
        assert_eq!(nearline.class_for_idle(40), StorageClass::Nearline);

        let coldline = policy(StorageClass::Coldline);
        assert_eq!(coldline.class_for_idle(40), StorageClass::Coldline);
    }

    #[test]
    fn test_idle_generation_cools_down() {
        let policy = policy(StorageClass::Archive);
        let config = SimulationConfig::default();
        let mut ledger = GenerationLedger::new();
        let id = ledger.create(0, 1000.0, 1.0)[0];
        policy.evaluate_month(0, &mut ledger, &config);
        assert_eq!(ledger.get(id).unwrap().class(), StorageClass::Standard);

        run_months(&policy, &mut ledger, &config, 1, 1);
        assert_eq!(ledger.get(id).unwrap().class(), StorageClass::Nearline);

        run_months(&policy, &mut ledger, &config, 2, 3);
        assert_eq!(ledger.get(id).unwrap().class(), StorageClass::Coldline);

        run_months(&policy, &mut ledger, &config, 4, 11);
        assert_eq!(ledger.get(id).unwrap().class(), StorageClass::Coldline);

        run_months(&policy, &mut ledger, &config, 12, 12);
        assert_eq!(ledger.get(id).unwrap().class(), StorageClass::Archive);
    }

    #[test]
    fn test_access_repromotes_accessed_share() {
        let policy = policy(StorageClass::Archive);
        let idle = SimulationConfig::default();
        let mut ledger = GenerationLedger::new();
        let id = ledger.create(0, 1000.0, 1.0)[0];
        run_months(&policy, &mut ledger, &idle, 1, 5);
        assert_eq!(ledger.get(id).unwrap().class(), StorageClass::Coldline);

        let busy = SimulationConfig {
            access_rates: AccessRates::default().with_rate(StorageClass::Coldline, 0.1),
            ..SimulationConfig::default()
        };
        ledger.advance_age();
        let events = policy.evaluate_month(6, &mut ledger, &busy);

        let original = ledger.get(id).unwrap();
        assert_eq!(original.class(), StorageClass::Coldline);
        assert_eq!(original.bytes(), 900.0);
        assert_eq!(original.class_age(), 3);

        let promoted = ledger
            .generations()
            .iter()
            .find(|generation| generation.was_promoted())
            .unwrap();
        assert_eq!(promoted.class(), StorageClass::Standard);
        assert_eq!(promoted.class_age(), 0);
        assert_eq!(promoted.bytes(), 100.0);
        assert_eq!(promoted.created_month(), 0);

        let objects = 100.0 / busy.avg_large_object_bytes;
        assert_eq!(
            events,
            vec![CostEvent::Repromotion {
                generation: promoted.id(),
                from: StorageClass::Coldline,
                bytes: 100.0,
                class_a_operations: objects,
            }]
        );
    }

    #[test]
    fn test_nearline_repromotion_is_free() {
        let policy = policy(StorageClass::Archive);
        let config = SimulationConfig {
            access_rates: AccessRates::default().with_rate(StorageClass::Nearline, 0.5),
            ..SimulationConfig::default()
        };
        let mut ledger = GenerationLedger::new();
        ledger.create(0, 1000.0, 1.0);
        ledger.advance_age();
        let events = policy.evaluate_month(1, &mut ledger, &config);

        let operations: f64 = events.iter().map(|event| event.class_a_operations()).sum();
        assert_eq!(operations, 0.0);
        assert_eq!(ledger.bytes_in(StorageClass::Standard), 500.0);
        assert_eq!(ledger.bytes_in(StorageClass::Nearline), 500.0);
    }

    #[test]
    fn test_pinned_bytes_never_move() {
        let policy = policy(StorageClass::Archive);
        let config = SimulationConfig::default();
        let mut ledger = GenerationLedger::new();
        ledger.create(0, 1000.0, 0.0);
        run_months(&policy, &mut ledger, &config, 1, 24);

        assert_eq!(ledger.bytes_in(StorageClass::Standard), 1000.0);
        assert!(policy.cost_events_for_month(&ledger, &config).is_empty());
    }

    #[test]
    fn test_management_fee_counts_every_eligible_byte() {
        let policy = policy(StorageClass::Archive);
        let config = SimulationConfig::default();
        let mut ledger = GenerationLedger::new();
        ledger.create(0, 1024.0 * 1024.0, 0.5);
        run_months(&policy, &mut ledger, &config, 1, 13);

        let events = policy.cost_events_for_month(&ledger, &config);
        assert_eq!(
            events,
            vec![CostEvent::ManagedObjects {
                count: 512.0 * 1024.0 / config.avg_large_object_bytes
            }]
        );
    }

    #[test]
    fn test_merging_ignores_creation_month() {
        let policy = policy(StorageClass::Archive);
        let mut ledger = GenerationLedger::new();
        ledger.create(1, 10.0, 1.0);
        ledger.create(2, 10.0, 1.0);

        let generations = ledger.generations();
        assert!(policy.interchangeable(&generations[0], &generations[1]));
    }
}
