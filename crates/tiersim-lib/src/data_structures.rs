use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

pub const KIB: f64 = 1024.0;
pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
pub const DAYS_PER_MONTH: f64 = 365.0 / 12.0;

/// Whole simulated months for a day count, rounded to the nearest month.
pub fn months_for_days(days: u32) -> u32 {
    (days as f64 / DAYS_PER_MONTH).round() as u32
}

pub fn bytes_to_gib(bytes: f64) -> f64 {
    bytes / BYTES_PER_GIB
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Standard,
    Nearline,
    Coldline,
    Archive,
}

impl StorageClass {
    /// Warmest first.
    pub const ALL: [StorageClass; 4] = [
        StorageClass::Standard,
        StorageClass::Nearline,
        StorageClass::Coldline,
        StorageClass::Archive,
    ];

    pub fn coldness(&self) -> usize {
        match self {
            StorageClass::Standard => 0,
            StorageClass::Nearline => 1,
            StorageClass::Coldline => 2,
            StorageClass::Archive => 3,
        }
    }

    pub fn is_colder_than(&self, other: StorageClass) -> bool {
        self.coldness() > other.coldness()
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageClass::Standard => "Standard",
            StorageClass::Nearline => "Nearline",
            StorageClass::Coldline => "Coldline",
            StorageClass::Archive => "Archive",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            StorageClass::Standard => "standard",
            StorageClass::Nearline => "nearline",
            StorageClass::Coldline => "coldline",
            StorageClass::Archive => "archive",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StorageClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(StorageClass::Standard),
            "nearline" => Ok(StorageClass::Nearline),
            "coldline" => Ok(StorageClass::Coldline),
            "archive" => Ok(StorageClass::Archive),
            other => Err(format!("unknown storage class: {}", other)),
        }
    }
}

/// Which tiering strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Autoclass,
    Lifecycle,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Autoclass => "Autoclass",
            Strategy::Lifecycle => "Lifecycle",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per storage class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierBytes([f64; 4]);

impl TierBytes {
    pub fn new() -> Self {
        Self([0.0; 4])
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StorageClass, f64)> + '_ {
        StorageClass::ALL.iter().map(move |class| (*class, self[*class]))
    }
}

impl Index<StorageClass> for TierBytes {
    type Output = f64;

    fn index(&self, class: StorageClass) -> &f64 {
        &self.0[class.coldness()]
    }
}

impl IndexMut<StorageClass> for TierBytes {
    fn index_mut(&mut self, class: StorageClass) -> &mut f64 {
        &mut self.0[class.coldness()]
    }
}

pub type GenerationId = u64;

/// A cohort of bytes that ages and transitions as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    id: GenerationId,
    created_month: u32,
    class: StorageClass,
    bytes: f64,
    eligible: bool,
    class_age: u32,
    idle_age: u32,
    promoted: bool,
}

impl Generation {
    pub(crate) fn new(id: GenerationId, created_month: u32, bytes: f64, eligible: bool) -> Self {
        Self {
            id,
            created_month,
            class: StorageClass::Standard,
            bytes,
            eligible,
            class_age: 0,
            idle_age: 0,
            promoted: false,
        }
    }

    pub fn id(&self) -> GenerationId {
        self.id
    }

    pub fn created_month(&self) -> u32 {
        self.created_month
    }

    pub fn class(&self) -> StorageClass {
        self.class
    }

    pub fn bytes(&self) -> f64 {
        self.bytes
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible
    }

    /// Months since the last class change.
    pub fn class_age(&self) -> u32 {
        self.class_age
    }

    /// Months since creation or the last re-promotion.
    pub fn idle_age(&self) -> u32 {
        self.idle_age
    }

    pub fn was_promoted(&self) -> bool {
        self.promoted
    }

    /// Months elapsed since creation as seen in `month`.
    pub fn age_at(&self, month: u32) -> u32 {
        month.saturating_sub(self.created_month)
    }

    pub(crate) fn set_id(&mut self, id: GenerationId) {
        self.id = id;
    }

    pub(crate) fn set_bytes(&mut self, bytes: f64) {
        self.bytes = bytes.max(0.0);
    }

    pub(crate) fn add_bytes(&mut self, bytes: f64) {
        self.bytes += bytes;
    }

    pub(crate) fn set_created_month(&mut self, month: u32) {
        self.created_month = month;
    }

    pub(crate) fn tick(&mut self) {
        self.class_age += 1;
        self.idle_age += 1;
    }

    pub(crate) fn move_to(&mut self, class: StorageClass) {
        if class != self.class {
            self.class = class;
            self.class_age = 0;
        }
    }

    pub(crate) fn repromote(&mut self) {
        self.class = StorageClass::Standard;
        self.class_age = 0;
        self.idle_age = 0;
        self.promoted = true;
    }
}

/// Itemised monthly cost in dollars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    storage: f64,
    retrieval: f64,
    early_deletion: f64,
    api_class_a: f64,
    api_class_b: f64,
    management_fee: f64,
}

impl CostBreakdown {
    pub fn new(
        storage: f64,
        retrieval: f64,
        early_deletion: f64,
        api_class_a: f64,
        api_class_b: f64,
        management_fee: f64,
    ) -> Self {
        Self {
            storage,
            retrieval,
            early_deletion,
            api_class_a,
            api_class_b,
            management_fee,
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

    pub fn api_class_a(&self) -> f64 {
        self.api_class_a
    }

    pub fn api_class_b(&self) -> f64 {
        self.api_class_b
    }

    pub fn api(&self) -> f64 {
        self.api_class_a + self.api_class_b
    }

    pub fn management_fee(&self) -> f64 {
        self.management_fee
    }

    pub fn total(&self) -> f64 {
        self.storage
            + self.retrieval
            + self.early_deletion
            + self.api_class_a
            + self.api_class_b
            + self.management_fee
    }

    pub fn is_finite(&self) -> bool {
        self.total().is_finite()
    }
}

impl std::ops::AddAssign for CostBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.storage += rhs.storage;
        self.retrieval += rhs.retrieval;
        self.early_deletion += rhs.early_deletion;
        self.api_class_a += rhs.api_class_a;
        self.api_class_b += rhs.api_class_b;
        self.management_fee += rhs.management_fee;
    }
}

/// One simulated month. Flat so it renders as one table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyResult {
    pub(crate) month: u32,
    pub(crate) period: Option<NaiveDate>,
    pub(crate) standard_bytes: f64,
    pub(crate) nearline_bytes: f64,
    pub(crate) coldline_bytes: f64,
    pub(crate) archive_bytes: f64,
    pub(crate) total_bytes: f64,
    pub(crate) ingested_bytes: f64,
    #[serde(flatten)]
    pub(crate) costs: CostBreakdown,
    pub(crate) total_cost: f64,
    pub(crate) cumulative_cost: f64,
    pub(crate) managed_objects: f64,
    pub(crate) total_objects: f64,
    pub(crate) transitioned_bytes: f64,
    pub(crate) reconciled_bytes: f64,
    pub(crate) generation_count: usize,
}

impl MonthlyResult {
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn period(&self) -> Option<NaiveDate> {
        self.period
    }

    pub fn bytes_in(&self, class: StorageClass) -> f64 {
        match class {
            StorageClass::Standard => self.standard_bytes,
            StorageClass::Nearline => self.nearline_bytes,
            StorageClass::Coldline => self.coldline_bytes,
            StorageClass::Archive => self.archive_bytes,
        }
    }

    pub fn tier_bytes(&self) -> TierBytes {
        let mut tiers = TierBytes::new();
        for class in StorageClass::ALL {
            tiers[class] = self.bytes_in(class);
        }
        tiers
    }

    pub fn total_bytes(&self) -> f64 {
        self.total_bytes
    }

    pub fn ingested_bytes(&self) -> f64 {
        self.ingested_bytes
    }

    pub fn costs(&self) -> &CostBreakdown {
        &self.costs
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn cumulative_cost(&self) -> f64 {
        self.cumulative_cost
    }

    /// Object-equivalents subject to the management fee.
    pub fn managed_objects(&self) -> f64 {
        self.managed_objects
    }

    pub fn total_objects(&self) -> f64 {
        self.total_objects
    }

    pub fn transitioned_bytes(&self) -> f64 {
        self.transitioned_bytes
    }

    /// Mass folded out of pruned generations this month.
    pub fn reconciled_bytes(&self) -> f64 {
        self.reconciled_bytes
    }

    pub fn generation_count(&self) -> usize {
        self.generation_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationWarning {
    /// The run stopped before `month` because `quantity` was not finite.
    NumericOverflow { month: u32, quantity: String },
}

impl fmt::Display for SimulationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationWarning::NumericOverflow { month, quantity } => write!(
                f,
                "{} overflowed in month {}; results stop at month {}",
                quantity,
                month,
                month.saturating_sub(1)
            ),
        }
    }
}

/// Everything one policy run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRun {
    strategy: Strategy,
    rows: Vec<MonthlyResult>,
    warnings: Vec<SimulationWarning>,
    truncated: bool,
}

impl SimulationRun {
    pub fn new(
        strategy: Strategy,
        rows: Vec<MonthlyResult>,
        warnings: Vec<SimulationWarning>,
        truncated: bool,
    ) -> Self {
        Self {
            strategy,
            rows,
            warnings,
            truncated,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn rows(&self) -> &[MonthlyResult] {
        &self.rows
    }

    pub fn warnings(&self) -> &[SimulationWarning] {
        &self.warnings
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn final_row(&self) -> Option<&MonthlyResult> {
        self.rows.last()
    }

    pub fn total_cost(&self) -> f64 {
        self.rows.last().map(|row| row.cumulative_cost()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_months_for_days_rounds_to_whole_months() {
        assert_eq!(months_for_days(0), 0);
        assert_eq!(months_for_days(30), 1);
        assert_eq!(months_for_days(90), 3);
        assert_eq!(months_for_days(180), 6);
        assert_eq!(months_for_days(365), 12);
    }

    #[test]
    fn test_storage_class_order() {
        assert!(StorageClass::Archive.is_colder_than(StorageClass::Coldline));
        assert!(!StorageClass::Standard.is_colder_than(StorageClass::Nearline));
        assert_eq!("ColdLine".parse::<StorageClass>(), Ok(StorageClass::Coldline));
        assert!("glacier".parse::<StorageClass>().is_err());
    }

    #[test]
    fn test_tier_bytes_indexing() {
        let mut tiers = TierBytes::new();
        tiers[StorageClass::Nearline] += 10.0;
        tiers[StorageClass::Archive] += 5.0;
        assert_eq!(tiers[StorageClass::Nearline], 10.0);
        assert_eq!(tiers.total(), 15.0);
    }

    #[test]
    fn test_move_to_resets_class_age_only_on_change() {
        let mut generation = Generation::new(0, 1, 100.0, true);
        generation.tick();
        generation.tick();
        generation.move_to(StorageClass::Standard);
        assert_eq!(generation.class_age(), 2);

        generation.move_to(StorageClass::Nearline);
        assert_eq!(generation.class_age(), 0);
        assert_eq!(generation.idle_age(), 2);
    }

    #[test]
    fn test_repromote_keeps_creation_month() {
        let mut generation = Generation::new(0, 3, 100.0, true);
        generation.tick();
        generation.move_to(StorageClass::Coldline);
        generation.repromote();

        assert_eq!(generation.class(), StorageClass::Standard);
        assert_eq!(generation.class_age(), 0);
        assert_eq!(generation.idle_age(), 0);
        assert_eq!(generation.created_month(), 3);
        assert!(generation.was_promoted());
    }

    #[test]
    fn test_cost_breakdown_total() {
        let costs = CostBreakdown::new(1.0, 2.0, 3.0, 0.5, 0.25, 0.25);
        assert_eq!(costs.total(), 7.0);
        assert_eq!(costs.api(), 0.75);
    }
}
