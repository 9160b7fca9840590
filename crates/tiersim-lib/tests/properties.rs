use proptest::prelude::*;
use tiersim_engine::config::{AccessRates, GrowthModel};
use tiersim_engine::data_structures::Strategy as Tiering;
use tiersim_engine::{Comparator, PricingTable, SimulationConfig, Simulator, StorageClass};

fn tiering() -> impl Strategy<Value = Tiering> {
    prop_oneof![Just(Tiering::Autoclass), Just(Tiering::Lifecycle)]
}

fn scenario() -> impl Strategy<Value = SimulationConfig> {
    (
        1e9f64..1e15,
        0.0f64..0.1,
        12u32..=36,
        0.0f64..=1.0,
        proptest::array::uniform4(0.0f64..0.3),
    )
        .prop_map(|(initial_bytes, monthly_rate, horizon_months, large, rates)| {
            SimulationConfig {
                initial_bytes,
                growth: GrowthModel::Percentage { monthly_rate },
                horizon_months,
                large_object_fraction: large,
                access_rates: AccessRates {
                    standard: rates[0],
                    nearline: rates[1],
                    coldline: rates[2],
                    archive: rates[3],
                },
                ..SimulationConfig::default()
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_bytes_are_conserved(config in scenario(), strategy in tiering()) {
        let run = Simulator::new(config, PricingTable::base())
            .unwrap()
            .run(strategy)
            .unwrap();

        let mut ingested = 0.0;
        for row in run.rows() {
            ingested += row.ingested_bytes();
            let by_class: f64 = StorageClass::ALL.iter().map(|class| row.bytes_in(*class)).sum();
            prop_assert!((row.total_bytes() - ingested).abs() <= ingested * 1e-9);
            prop_assert!((by_class - row.total_bytes()).abs() <= ingested * 1e-9);
        }
    }

    #[test]
    fn prop_costs_are_finite_and_non_negative(config in scenario(), strategy in tiering()) {
        let run = Simulator::new(config, PricingTable::base())
            .unwrap()
            .run(strategy)
            .unwrap();

        for row in run.rows() {
            let costs = row.costs();
            for component in [
                costs.storage(),
                costs.retrieval(),
                costs.early_deletion(),
                costs.api_class_a(),
                costs.api_class_b(),
                costs.management_fee(),
            ] {
                prop_assert!(component.is_finite());
                prop_assert!(component >= 0.0);
            }
        }
        for pair in run.rows().windows(2) {
            prop_assert!(pair[1].cumulative_cost() >= pair[0].cumulative_cost());
        }
    }

    #[test]
    fn prop_comparisons_are_deterministic(config in scenario()) {
        let first = Comparator::new(Simulator::new(config.clone(), PricingTable::base()).unwrap())
            .compare()
            .unwrap();
        let second = Comparator::new(Simulator::new(config, PricingTable::base()).unwrap())
            .compare()
            .unwrap();

        prop_assert_eq!(first, second);
    }
}
