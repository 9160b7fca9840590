use crate::data_structures::{months_for_days, StorageClass, KIB};
use crate::error::{Result, SimulationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MIN_HORIZON_MONTHS: u32 = 12;
pub const MAX_HORIZON_MONTHS: u32 = 60;
pub const DEFAULT_ELIGIBILITY_THRESHOLD_BYTES: u64 = 128 * 1024;

/// How much new data arrives after month 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum GrowthModel {
    #[default]
    None,
    /// Total resident bytes grow by `monthly_rate` (0.05 = 5%) each month.
    Percentage { monthly_rate: f64 },
    /// A fixed number of bytes is ingested each month.
    Fixed { bytes_per_month: f64 },
}

/// Fraction of resident bytes read back per month, by class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccessRates {
    pub standard: f64,
    pub nearline: f64,
    pub coldline: f64,
    pub archive: f64,
}

impl AccessRates {
    pub fn rate(&self, class: StorageClass) -> f64 {
        match class {
            StorageClass::Standard => self.standard,
            StorageClass::Nearline => self.nearline,
            StorageClass::Coldline => self.coldline,
            StorageClass::Archive => self.archive,
        }
    }

    pub fn with_rate(mut self, class: StorageClass, rate: f64) -> Self {
        match class {
            StorageClass::Standard => self.standard = rate,
            StorageClass::Nearline => self.nearline = rate,
            StorageClass::Coldline => self.coldline = rate,
            StorageClass::Archive => self.archive = rate,
        }
        self
    }
}

/// Monthly API operation counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OperationCounts {
    pub class_a: f64,
    pub class_b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoclassParams {
    pub terminal_class: StorageClass,
}

impl Default for AutoclassParams {
    fn default() -> Self {
        Self {
            terminal_class: StorageClass::Archive,
        }
    }
}

/// Creation-age thresholds, in days, for each Lifecycle transition.
/// A missing threshold skips that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRules {
    pub nearline_days: Option<u32>,
    pub coldline_days: Option<u32>,
    pub archive_days: Option<u32>,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        LifecyclePreset::FullLinear.rules()
    }
}

impl LifecycleRules {
    pub fn new(nearline_days: Option<u32>, coldline_days: Option<u32>, archive_days: Option<u32>) -> Self {
        Self {
            nearline_days,
            coldline_days,
            archive_days,
        }
    }

    pub fn days_for(&self, class: StorageClass) -> Option<u32> {
        match class {
            StorageClass::Standard => None,
            StorageClass::Nearline => self.nearline_days,
            StorageClass::Coldline => self.coldline_days,
            StorageClass::Archive => self.archive_days,
        }
    }

    /// Set thresholds, warmest first.
    pub fn steps(&self) -> Vec<(StorageClass, u32)> {
        StorageClass::ALL
            .iter()
            .filter_map(|class| self.days_for(*class).map(|days| (*class, days)))
            .collect()
    }

    /// Coldest class the rules reach.
    pub fn terminal_class(&self) -> StorageClass {
        self.steps()
            .last()
            .map(|(class, _)| *class)
            .unwrap_or(StorageClass::Standard)
    }

    /// Class a cohort of the given creation age belongs in.
    pub fn class_for_age(&self, age_months: u32) -> StorageClass {
        self.steps()
            .iter()
            .rev()
            .find(|(_, days)| age_months >= months_for_days(*days))
            .map(|(class, _)| *class)
            .unwrap_or(StorageClass::Standard)
    }

    pub fn validate(&self) -> Result<()> {
        let steps = self.steps();
        if steps.is_empty() {
            return Err(SimulationError::configuration(
                "lifecycle",
                "at least one transition threshold is required",
            ));
        }

        for pair in steps.windows(2) {
            let (warmer, colder) = (pair[0], pair[1]);
            if colder.1 <= warmer.1 {
                return Err(SimulationError::configuration(
                    format!("lifecycle.{}_days", colder.0.key()),
                    format!(
                        "must be greater than {}_days ({} <= {})",
                        warmer.0.key(),
                        colder.1,
                        warmer.1
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Named Lifecycle transition paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecyclePreset {
    FullLinear,
    StandardNearlineColdline,
    StandardNearlineArchive,
    StandardNearline,
    StandardColdlineArchive,
    StandardColdline,
    StandardArchive,
}

impl LifecyclePreset {
    pub const ALL: [LifecyclePreset; 7] = [
        LifecyclePreset::FullLinear,
        LifecyclePreset::StandardNearlineColdline,
        LifecyclePreset::StandardNearlineArchive,
        LifecyclePreset::StandardNearline,
        LifecyclePreset::StandardColdlineArchive,
        LifecyclePreset::StandardColdline,
        LifecyclePreset::StandardArchive,
    ];

    pub fn rules(&self) -> LifecycleRules {
        match self {
            LifecyclePreset::FullLinear => LifecycleRules::new(Some(30), Some(90), Some(365)),
            LifecyclePreset::StandardNearlineColdline => LifecycleRules::new(Some(30), Some(90), None),
            LifecyclePreset::StandardNearlineArchive => LifecycleRules::new(Some(30), None, Some(180)),
            LifecyclePreset::StandardNearline => LifecycleRules::new(Some(30), None, None),
            LifecyclePreset::StandardColdlineArchive => LifecycleRules::new(None, Some(90), Some(365)),
            LifecyclePreset::StandardColdline => LifecycleRules::new(None, Some(90), None),
            LifecyclePreset::StandardArchive => LifecycleRules::new(None, None, Some(365)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecyclePreset::FullLinear => "Standard → Nearline → Coldline → Archive",
            LifecyclePreset::StandardNearlineColdline => "Standard → Nearline → Coldline",
            LifecyclePreset::StandardNearlineArchive => "Standard → Nearline → Archive",
            LifecyclePreset::StandardNearline => "Standard → Nearline",
            LifecyclePreset::StandardColdlineArchive => "Standard → Coldline → Archive",
            LifecyclePreset::StandardColdline => "Standard → Coldline",
            LifecyclePreset::StandardArchive => "Standard → Archive",
        }
    }
}

/// Inputs of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_bytes: f64,
    pub growth: GrowthModel,
    pub horizon_months: u32,
    pub large_object_fraction: f64,
    pub eligibility_threshold_bytes: u64,
    pub avg_large_object_bytes: f64,
    pub avg_small_object_bytes: f64,
    pub access_rates: AccessRates,
    pub operations: OperationCounts,
    pub negligible_fraction: f64,
    pub start_date: Option<NaiveDate>,
    pub autoclass: AutoclassParams,
    pub lifecycle: LifecycleRules,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_bytes: 10.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0,
            growth: GrowthModel::None,
            horizon_months: MIN_HORIZON_MONTHS,
            large_object_fraction: 0.8,
            eligibility_threshold_bytes: DEFAULT_ELIGIBILITY_THRESHOLD_BYTES,
            avg_large_object_bytes: 512.0 * KIB,
            avg_small_object_bytes: 64.0 * KIB,
            access_rates: AccessRates::default(),
            operations: OperationCounts {
                class_a: 1_000.0,
                class_b: 10_000.0,
            },
            negligible_fraction: 1e-6,
            start_date: None,
            autoclass: AutoclassParams::default(),
            lifecycle: LifecycleRules::default(),
        }
    }
}

impl SimulationConfig {
    /// Range checks the engine relies on. Policy-specific parameters are
    /// checked by the policies themselves.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("initial_bytes", self.initial_bytes)?;

        if !(MIN_HORIZON_MONTHS..=MAX_HORIZON_MONTHS).contains(&self.horizon_months) {
            return Err(SimulationError::configuration(
                "horizon_months",
                format!(
                    "must be between {} and {} (got {})",
                    MIN_HORIZON_MONTHS, MAX_HORIZON_MONTHS, self.horizon_months
                ),
            ));
        }

        match self.growth {
            GrowthModel::None => {}
            GrowthModel::Percentage { monthly_rate } => {
                check_non_negative("growth.monthly_rate", monthly_rate)?
            }
            GrowthModel::Fixed { bytes_per_month } => {
                check_non_negative("growth.bytes_per_month", bytes_per_month)?
            }
        }

        check_fraction("large_object_fraction", self.large_object_fraction)?;
        check_fraction("negligible_fraction", self.negligible_fraction)?;
        for class in StorageClass::ALL {
            check_fraction(
                &format!("access_rates.{}", class.key()),
                self.access_rates.rate(class),
            )?;
        }

        check_non_negative("operations.class_a", self.operations.class_a)?;
        check_non_negative("operations.class_b", self.operations.class_b)?;

        let threshold = self.eligibility_threshold_bytes as f64;
        if !(self.avg_large_object_bytes.is_finite() && self.avg_large_object_bytes >= threshold) {
            return Err(SimulationError::configuration(
                "avg_large_object_bytes",
                format!("must be at least the eligibility threshold ({} bytes)", threshold),
            ));
        }
        if !(self.avg_small_object_bytes > 0.0 && self.avg_small_object_bytes < threshold) {
            return Err(SimulationError::configuration(
                "avg_small_object_bytes",
                format!("must be positive and below the eligibility threshold ({} bytes)", threshold),
            ));
        }

        if self.autoclass.terminal_class == StorageClass::Standard {
            return Err(SimulationError::configuration(
                "autoclass.terminal_class",
                "must be nearline, coldline or archive",
            ));
        }

        Ok(())
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::configuration(
            field,
            format!("must be a finite, non-negative number (got {})", value),
        ))
    }
}

fn check_fraction(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::configuration(
            field,
            format!("must be between 0 and 1 (got {})", value),
        ))
    }
}
