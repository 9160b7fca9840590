//! Storage-class transition policies.
//!
//! Both strategies run against the same [`GenerationLedger`] and report what
//! happened as [`CostEvent`]s, which the calculator prices. Nothing outside
//! this module knows which strategy is active.

pub mod autoclass;
pub mod lifecycle;

pub use autoclass::AutoclassPolicy;
pub use lifecycle::LifecyclePolicy;

use crate::config::SimulationConfig;
use crate::data_structures::{Generation, GenerationId, StorageClass, Strategy};
use crate::error::Result;
use crate::ledger::GenerationLedger;
use crate::pricing::PricingTable;

/// Something a policy did this month that may cost money.
#[derive(Debug, Clone, PartialEq)]
pub enum CostEvent {
    /// A generation moved to a colder class.
    Transition {
        generation: GenerationId,
        from: StorageClass,
        to: StorageClass,
        bytes: f64,
        class_a_operations: f64,
    },
    /// Accessed bytes were split off and returned to Standard.
    Repromotion {
        generation: GenerationId,
        from: StorageClass,
        bytes: f64,
        class_a_operations: f64,
    },
    /// Bytes read back from `class`.
    Retrieval { class: StorageClass, bytes: f64 },
    /// Bytes accessed before `class`'s minimum storage duration ran out.
    EarlyDeletion {
        class: StorageClass,
        bytes: f64,
        remaining_days: f64,
    },
    /// Object-equivalents subject to the management fee this month.
    ManagedObjects { count: f64 },
}

impl CostEvent {
    /// Bytes that changed storage class.
    pub fn moved_bytes(&self) -> f64 {
        match self {
            CostEvent::Transition { bytes, .. } | CostEvent::Repromotion { bytes, .. } => *bytes,
            _ => 0.0,
        }
    }

    pub fn class_a_operations(&self) -> f64 {
        match self {
            CostEvent::Transition {
                class_a_operations, ..
            }
            | CostEvent::Repromotion {
                class_a_operations, ..
            } => *class_a_operations,
            _ => 0.0,
        }
    }
}

pub trait TransitionPolicy {
    fn strategy(&self) -> Strategy;

    /// Moves, splits and re-promotes generations for `month`. Ages have
    /// already been advanced. Returns the events the changes caused.
    fn evaluate_month(
        &self,
        month: u32,
        ledger: &mut GenerationLedger,
        config: &SimulationConfig,
    ) -> Vec<CostEvent>;

    /// Standing charges on the generation set as it stands after evaluation.
    fn cost_events_for_month(
        &self,
        _ledger: &GenerationLedger,
        _config: &SimulationConfig,
    ) -> Vec<CostEvent> {
        Vec::new()
    }

    /// Whether two generations can be folded into one without changing any
    /// future outcome. Pinned bytes never move, so their ages are irrelevant.
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
            && a.created_month() == b.created_month()
    }
}

/// Builds the policy for `strategy` from the run's inputs.
pub fn policy_for(
    strategy: Strategy,
    config: &SimulationConfig,
    pricing: &PricingTable,
) -> Result<Box<dyn TransitionPolicy>> {
    Ok(match strategy {
        Strategy::Autoclass => Box::new(AutoclassPolicy::new(config.autoclass)?),
        Strategy::Lifecycle => Box::new(LifecyclePolicy::new(config.lifecycle, pricing)?),
    })
}
