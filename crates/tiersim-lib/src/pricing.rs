use crate::data_structures::StorageClass;
use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

pub const DEFAULT_REGION: &str = "us-central1";

/// Rates for a single storage class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    /// $ per GiB-month resident.
    storage: f64,
    /// $ per GiB read back.
    #[serde(default)]
    retrieval: f64,
    /// $ per GiB-month of unexpired minimum duration.
    #[serde(default)]
    early_deletion: f64,
    #[serde(default)]
    min_storage_days: u32,
}

impl TierRates {
    const FREE: TierRates = TierRates {
        storage: 0.0,
        retrieval: 0.0,
        early_deletion: 0.0,
        min_storage_days: 0,
    };

    pub fn new(storage: f64, retrieval: f64, early_deletion: f64, min_storage_days: u32) -> Self {
        Self {
            storage,
            retrieval,
            early_deletion,
            min_storage_days,
        }
    }

    pub fn storage(&self) -> f64 {
        self.storage
    }

    pub fn retrieval(&self) -> f64 {
        self.retrieval
    }

    pub fn early_deletion(&self) -> f64 {
        self.early_deletion
    }

    pub fn min_storage_days(&self) -> u32 {
        self.min_storage_days
    }
}

/// $ per operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationRates {
    class_a: f64,
    class_b: f64,
}

impl OperationRates {
    pub fn new(class_a: f64, class_b: f64) -> Self {
        Self { class_a, class_b }
    }

    pub fn class_a(&self) -> f64 {
        self.class_a
    }

    pub fn class_b(&self) -> f64 {
        self.class_b
    }
}

/// Cost multipliers a region applies on top of the base schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionalMultipliers {
    pub storage: f64,
    pub api: f64,
    pub network: f64,
}

/// Rate schedule for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    region: String,
    tiers: BTreeMap<StorageClass, TierRates>,
    operations: OperationRates,
    management_fee_per_1000_objects: f64,
}

impl PricingTable {
    pub fn new(
        region: impl Into<String>,
        tiers: BTreeMap<StorageClass, TierRates>,
        operations: OperationRates,
        management_fee_per_1000_objects: f64,
    ) -> Self {
        Self {
            region: region.into(),
            tiers,
            operations,
            management_fee_per_1000_objects,
        }
    }

    /// us-central1 list prices.
    pub fn base() -> Self {
        let mut tiers = BTreeMap::new();
        tiers.insert(StorageClass::Standard, TierRates::new(0.020, 0.0, 0.0, 0));
        tiers.insert(StorageClass::Nearline, TierRates::new(0.010, 0.01, 0.010, 30));
        tiers.insert(StorageClass::Coldline, TierRates::new(0.004, 0.02, 0.004, 90));
        tiers.insert(StorageClass::Archive, TierRates::new(0.0012, 0.05, 0.0012, 365));

        Self::new(
            DEFAULT_REGION,
            tiers,
            OperationRates::new(0.05 / 10_000.0, 0.004 / 10_000.0),
            0.0025,
        )
    }

    pub fn scaled(&self, region: impl Into<String>, multipliers: RegionalMultipliers) -> Self {
        let tiers = self
            .tiers
            .iter()
            .map(|(class, rates)| {
                (
                    *class,
                    TierRates::new(
                        rates.storage * multipliers.storage,
                        rates.retrieval * multipliers.network,
                        rates.early_deletion * multipliers.storage,
                        rates.min_storage_days,
                    ),
                )
            })
            .collect();

        Self::new(
            region,
            tiers,
            OperationRates::new(
                self.operations.class_a * multipliers.api,
                self.operations.class_b * multipliers.api,
            ),
            self.management_fee_per_1000_objects * multipliers.storage,
        )
    }

    pub fn with_tier(mut self, class: StorageClass, rates: TierRates) -> Self {
        self.tiers.insert(class, rates);
        self
    }

    pub fn without_tier(mut self, class: StorageClass) -> Self {
        self.tiers.remove(&class);
        self
    }

    pub fn with_operations(mut self, operations: OperationRates) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_management_fee(mut self, per_1000_objects: f64) -> Self {
        self.management_fee_per_1000_objects = per_1000_objects;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Rates for `class`. Tables are validated before a run, so a missing
    /// tier only shows up here on an unvalidated table and reads as free.
    pub fn tier(&self, class: StorageClass) -> &TierRates {
        self.tiers.get(&class).unwrap_or(&TierRates::FREE)
    }

    pub fn operations(&self) -> &OperationRates {
        &self.operations
    }

    pub fn management_fee_per_1000_objects(&self) -> f64 {
        self.management_fee_per_1000_objects
    }

    /// Fails on the first missing tier or negative/non-finite rate.
    pub fn validate(&self) -> Result<()> {
        for class in StorageClass::ALL {
            let rates = self.tiers.get(&class).ok_or_else(|| {
                SimulationError::configuration(
                    format!("pricing.tiers.{}", class.key()),
                    "missing tier entry",
                )
            })?;

            check_rate(&format!("pricing.tiers.{}.storage", class.key()), rates.storage)?;
            check_rate(&format!("pricing.tiers.{}.retrieval", class.key()), rates.retrieval)?;
            check_rate(
                &format!("pricing.tiers.{}.early_deletion", class.key()),
                rates.early_deletion,
            )?;
        }

        check_rate("pricing.operations.class_a", self.operations.class_a)?;
        check_rate("pricing.operations.class_b", self.operations.class_b)?;
        check_rate(
            "pricing.management_fee_per_1000_objects",
            self.management_fee_per_1000_objects,
        )?;

        for pair in StorageClass::ALL.windows(2) {
            let (warmer, colder) = (self.tier(pair[0]), self.tier(pair[1]));
            if colder.storage >= warmer.storage {
                warn!(
                    region = %self.region,
                    "{} storage (${:.4}) is not cheaper than {} (${:.4})",
                    pair[1],
                    colder.storage,
                    pair[0],
                    warmer.storage
                );
            }
        }

        Ok(())
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::base()
    }
}

fn check_rate(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SimulationError::configuration(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(SimulationError::configuration(
            field,
            format!("must be non-negative (got {})", value),
        ));
    }
    Ok(())
}

/// Built-in regional rate schedules.
pub struct PricingCatalog {
    pricing_cache: HashMap<String, PricingTable>,
}

impl PricingCatalog {
    pub fn new() -> Self {
        let base = PricingTable::base();
        let mut pricing_cache = HashMap::new();

        let regions = [
            ("us-central1", 1.0, 1.0, 1.0),
            ("us-east1", 1.0, 1.0, 1.0),
            ("us-west1", 1.0, 1.0, 1.0),
            ("europe-west1", 1.0, 1.0, 1.2),
            ("europe-west2", 1.05, 1.05, 1.25),
            ("asia-southeast1", 1.0, 1.0, 1.15),
            ("asia-northeast1", 1.1, 1.1, 1.2),
            ("australia-southeast1", 1.1, 1.1, 1.3),
        ];

        for (region, storage, api, network) in regions {
            pricing_cache.insert(
                region.to_string(),
                base.scaled(
                    region,
                    RegionalMultipliers {
                        storage,
                        api,
                        network,
                    },
                ),
            );
        }

        Self { pricing_cache }
    }

    pub fn get_pricing(&self, region: &str) -> Option<&PricingTable> {
        self.pricing_cache.get(region)
    }

    pub fn supported_regions(&self) -> Vec<&String> {
        let mut regions: Vec<&String> = self.pricing_cache.keys().collect();
        regions.sort();
        regions
    }
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self::new()
    }
}
