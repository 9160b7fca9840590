pub mod analysis;
pub mod calculator;
pub mod comparator;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod policy;
pub mod pricing;
pub mod simulator;

pub use analysis::Analyzer;
pub use calculator::{Calculator, CostAccumulator};
pub use comparator::{Comparator, Comparison, Crossover, DeltaRow, Leader};
pub use config::{GrowthModel, LifecyclePreset, LifecycleRules, SimulationConfig};
pub use data_structures::{
    CostBreakdown, Generation, MonthlyResult, SimulationRun, SimulationWarning, StorageClass,
    Strategy,
};
pub use error::SimulationError;
pub use ledger::GenerationLedger;
pub use loader::{Scenario, ScenarioLoader};
pub use policy::{AutoclassPolicy, CostEvent, LifecyclePolicy, TransitionPolicy};
pub use pricing::{PricingCatalog, PricingTable};
pub use simulator::{IngestionSchedule, Simulator};

pub use chrono::NaiveDate;

pub mod prelude {
    pub use crate::comparator::{Comparator, Comparison, Leader};
    pub use crate::config::SimulationConfig;
    pub use crate::data_structures::{MonthlyResult, SimulationRun, StorageClass, Strategy};
    pub use crate::loader::ScenarioLoader;
    pub use crate::pricing::PricingTable;
    pub use crate::simulator::Simulator;
    pub use anyhow::Result;
}
