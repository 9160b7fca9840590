use tiersim_engine::config::{AccessRates, GrowthModel, LifecycleRules};
use tiersim_engine::data_structures::BYTES_PER_GIB;
use tiersim_engine::policy::{AutoclassPolicy, LifecyclePolicy, TransitionPolicy};
use tiersim_engine::pricing::{OperationRates, TierRates};
use tiersim_engine::{
    Comparator, GenerationLedger, Leader, PricingTable, SimulationConfig, SimulationRun,
    SimulationWarning, Simulator, StorageClass, Strategy,
};

fn idle_config(horizon_months: u32) -> SimulationConfig {
    SimulationConfig {
        initial_bytes: 1024.0 * BYTES_PER_GIB,
        large_object_fraction: 1.0,
        horizon_months,
        ..SimulationConfig::default()
    }
}

fn run(config: SimulationConfig, strategy: Strategy) -> SimulationRun {
    Simulator::new(config, PricingTable::base())
        .unwrap()
        .run(strategy)
        .unwrap()
}

fn dominant_class(run: &SimulationRun, month: u32) -> StorageClass {
    let row = &run.rows()[month as usize - 1];
    StorageClass::ALL
        .into_iter()
        .max_by(|a, b| row.bytes_in(*a).total_cmp(&row.bytes_in(*b)))
        .unwrap()
}

#[test]
fn test_idle_data_follows_the_same_path_under_both_policies() {
    for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
        let run = run(idle_config(24), strategy);

        assert_eq!(dominant_class(&run, 1), StorageClass::Standard);
        assert_eq!(dominant_class(&run, 2), StorageClass::Nearline);
        assert_eq!(dominant_class(&run, 3), StorageClass::Nearline);
        assert_eq!(dominant_class(&run, 4), StorageClass::Coldline);
        assert_eq!(dominant_class(&run, 12), StorageClass::Coldline);
        assert_eq!(dominant_class(&run, 13), StorageClass::Archive);
        assert_eq!(dominant_class(&run, 24), StorageClass::Archive);
    }
}

#[test]
fn test_access_returns_autoclass_data_to_standard_but_not_lifecycle() {
    let idle = SimulationConfig::default();
    let busy = SimulationConfig {
        access_rates: AccessRates::default().with_rate(StorageClass::Coldline, 0.25),
        ..SimulationConfig::default()
    };
    let autoclass = AutoclassPolicy::new(idle.autoclass).unwrap();
    let lifecycle = LifecyclePolicy::new(LifecycleRules::default(), &PricingTable::base()).unwrap();

    let mut autoclass_ledger = GenerationLedger::new();
    let mut lifecycle_ledger = GenerationLedger::new();
    autoclass_ledger.create(0, 1000.0, 1.0);
    lifecycle_ledger.create(0, 1000.0, 1.0);

    for month in 1..=6 {
        let config = if month == 6 { &busy } else { &idle };
        autoclass_ledger.advance_age();
        autoclass.evaluate_month(month, &mut autoclass_ledger, config);
        lifecycle_ledger.advance_age();
        lifecycle.evaluate_month(month, &mut lifecycle_ledger, config);
    }

    assert_eq!(lifecycle_ledger.bytes_in(StorageClass::Coldline), 1000.0);
    assert_eq!(lifecycle_ledger.bytes_in(StorageClass::Standard), 0.0);

    assert_eq!(autoclass_ledger.bytes_in(StorageClass::Coldline), 750.0);
    assert_eq!(autoclass_ledger.bytes_in(StorageClass::Standard), 250.0);
    let promoted = autoclass_ledger
        .generations()
        .iter()
        .find(|generation| generation.class() == StorageClass::Standard)
        .unwrap();
    assert_eq!(promoted.class_age(), 0);
    assert!(promoted.was_promoted());
}

#[test]
fn test_early_access_charges_only_lifecycle() {
    let config = SimulationConfig {
        access_rates: AccessRates::default().with_rate(StorageClass::Coldline, 0.1),
        ..idle_config(12)
    };
    let lifecycle = run(config.clone(), Strategy::Lifecycle);
    let autoclass = run(config, Strategy::Autoclass);

    let month_five = &lifecycle.rows()[4];
    assert!(month_five.costs().retrieval() > 0.0);
    assert!(month_five.costs().early_deletion() > 0.0);

    for row in autoclass.rows() {
        assert_eq!(row.costs().retrieval(), 0.0);
        assert_eq!(row.costs().early_deletion(), 0.0);
    }
}

#[test]
fn test_idle_runs_never_get_cheaper_in_total() {
    for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
        let run = run(idle_config(36), strategy);
        let initial = 1024.0 * BYTES_PER_GIB;

        for pair in run.rows().windows(2) {
            assert!(pair[1].cumulative_cost() >= pair[0].cumulative_cost());
        }
        for row in run.rows() {
            assert!((row.total_bytes() - initial).abs() / initial < 1e-12);
        }
    }
}

#[test]
fn test_runs_are_reproducible() {
    let config = SimulationConfig {
        growth: GrowthModel::Percentage { monthly_rate: 0.03 },
        access_rates: AccessRates {
            standard: 0.2,
            nearline: 0.05,
            coldline: 0.02,
            archive: 0.01,
        },
        horizon_months: 48,
        ..SimulationConfig::default()
    };

    for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
        assert_eq!(run(config.clone(), strategy), run(config.clone(), strategy));
    }
}

#[test]
fn test_lifecycle_leads_when_management_fee_is_the_only_difference() {
    let pricing = PricingTable::base().with_operations(OperationRates::new(0.0, 0.0));
    let simulator = Simulator::new(idle_config(24), pricing).unwrap();
    let comparison = Comparator::new(simulator).compare().unwrap();

    assert!(comparison
        .deltas
        .iter()
        .all(|delta| delta.leader == Leader::Lifecycle));
    assert!(comparison.crossovers.is_empty());
    assert!(comparison.first_crossover().is_none());
    assert_eq!(comparison.summary.winner, Leader::Lifecycle);
}

#[test]
fn test_small_objects_stay_in_standard() {
    let config = SimulationConfig {
        large_object_fraction: 0.0,
        access_rates: AccessRates::default().with_rate(StorageClass::Standard, 0.3),
        ..idle_config(24)
    };

    for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
        let run = run(config.clone(), strategy);
        for row in run.rows() {
            assert_eq!(row.costs().management_fee(), 0.0);
            assert_eq!(row.transitioned_bytes(), 0.0);
            assert_eq!(row.bytes_in(StorageClass::Standard), row.total_bytes());
        }
    }
}

#[test]
fn test_invalid_inputs_name_the_field() {
    let negative = PricingTable::base()
        .with_tier(StorageClass::Coldline, TierRates::new(-0.004, 0.02, 0.004, 90));
    let err = Simulator::new(SimulationConfig::default(), negative)
        .err()
        .unwrap();
    assert_eq!(err.field(), Some("pricing.tiers.coldline.storage"));

    let missing = PricingTable::base().without_tier(StorageClass::Archive);
    let err = Simulator::new(SimulationConfig::default(), missing)
        .err()
        .unwrap();
    assert_eq!(err.field(), Some("pricing.tiers.archive"));

    let config = SimulationConfig {
        lifecycle: LifecycleRules::new(Some(90), Some(90), None),
        ..SimulationConfig::default()
    };
    let err = Simulator::new(config, PricingTable::base()).err().unwrap();
    assert_eq!(err.field(), Some("lifecycle.coldline_days"));
}

#[test]
fn test_extreme_growth_truncates_with_finite_rows() {
    let config = SimulationConfig {
        initial_bytes: 1e15,
        growth: GrowthModel::Percentage { monthly_rate: 1e60 },
        horizon_months: 24,
        ..SimulationConfig::default()
    };

    for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
        let run = run(config.clone(), strategy);

        assert!(run.is_truncated());
        assert!(run.rows().len() < 24);
        assert!(matches!(
            run.warnings().first(),
            Some(SimulationWarning::NumericOverflow { .. })
        ));
        for row in run.rows() {
            assert!(row.total_bytes().is_finite());
            assert!(row.total_cost().is_finite());
            assert!(row.cumulative_cost().is_finite());
        }
    }
}
