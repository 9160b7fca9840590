use crate::config::{LifecyclePreset, SimulationConfig};
use crate::pricing::{PricingCatalog, PricingTable, DEFAULT_REGION};
use crate::simulator::Simulator;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A scenario file: simulation inputs plus where to take prices from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Scenario {
    pub name: Option<String>,
    /// Built-in region to price against. Ignored when `pricing` is set.
    pub region: Option<String>,
    /// Inline rate schedule.
    pub pricing: Option<PricingTable>,
    /// Replaces `simulation.lifecycle` with a named path.
    pub lifecycle_preset: Option<LifecyclePreset>,
    pub simulation: SimulationConfig,
}

impl Scenario {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed scenario")
    }

    /// The simulation inputs with any preset applied.
    pub fn simulation_config(&self) -> SimulationConfig {
        let mut config = self.simulation.clone();
        if let Some(preset) = self.lifecycle_preset {
            config.lifecycle = preset.rules();
        }
        config
    }
}

pub struct ScenarioLoader {
    catalog: PricingCatalog,
}

impl ScenarioLoader {
    pub fn new() -> Self {
        Self {
            catalog: PricingCatalog::new(),
        }
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    pub fn load_scenario<P: AsRef<Path>>(&self, path: P) -> Result<Scenario> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
        let scenario: Scenario = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))?;

        debug!(path = %path.display(), name = scenario.display_name(), "loaded scenario");
        Ok(scenario)
    }

    pub fn load_pricing<P: AsRef<Path>>(&self, path: P) -> Result<PricingTable> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pricing file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse pricing file: {}", path.display()))
    }

    /// Inline pricing wins, then `region_override`, then the scenario's
    /// region, then the default region.
    pub fn resolve_pricing(
        &self,
        scenario: &Scenario,
        region_override: Option<&str>,
    ) -> Result<PricingTable> {
        if let Some(pricing) = &scenario.pricing {
            return Ok(pricing.clone());
        }

        let region = region_override
            .or(scenario.region.as_deref())
            .unwrap_or(DEFAULT_REGION);
        self.catalog.get_pricing(region).cloned().ok_or_else(|| {
            let supported: Vec<&str> = self
                .catalog
                .supported_regions()
                .into_iter()
                .map(String::as_str)
                .collect();
            anyhow!(
                "Unknown region '{}' (supported: {})",
                region,
                supported.join(", ")
            )
        })
    }

    pub fn build_simulator(
        &self,
        scenario: &Scenario,
        region_override: Option<&str>,
    ) -> Result<Simulator> {
        let pricing = self.resolve_pricing(scenario, region_override)?;
        Simulator::new(scenario.simulation_config(), pricing)
            .with_context(|| format!("Invalid scenario: {}", scenario.display_name()))
    }
}

impl Default for ScenarioLoader {
    fn default() -> Self {
        Self::new()
    }
}
