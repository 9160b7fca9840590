use std::env;
use tiersim_engine::analysis::Analyzer;
use tiersim_engine::data_structures::bytes_to_gib;
use tiersim_engine::prelude::*;

fn format_gib(bytes: f64) -> String {
    let gib = bytes_to_gib(bytes);
    if gib >= 1024.0 {
        format!("{:.1} TiB", gib / 1024.0)
    } else {
        format!("{:.1} GiB", gib)
    }
}

fn print_run(run: &SimulationRun) {
    println!("\n--- {} ---", run.strategy());
    println!(
        "{:>5} {:>12} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "Month", "Standard", "Nearline", "Coldline", "Archive", "Cost", "Cumulative"
    );
    for row in run.rows() {
        println!(
            "{:>5} {:>12} {:>12} {:>12} {:>12} {:>12.2} {:>14.2}",
            row.month(),
            format_gib(row.bytes_in(StorageClass::Standard)),
            format_gib(row.bytes_in(StorageClass::Nearline)),
            format_gib(row.bytes_in(StorageClass::Coldline)),
            format_gib(row.bytes_in(StorageClass::Archive)),
            row.total_cost(),
            row.cumulative_cost()
        );
    }
    for warning in run.warnings() {
        println!("Warning: {}", warning);
    }
}

fn main() -> Result<()> {
    let loader = ScenarioLoader::new();
    let args: Vec<String> = env::args().collect();

    let simulator = if args.len() >= 2 {
        let path = shellexpand::tilde(&args[1]).to_string();
        println!("Loading scenario from: {}", path);
        let scenario = loader.load_scenario(&path)?;
        loader.build_simulator(&scenario, None)?
    } else {
        println!("No scenario given, simulating 10 TiB over 12 months");
        Simulator::new(SimulationConfig::default(), PricingTable::base())?
    };

    let comparison = Comparator::new(simulator).compare()?;
    print_run(&comparison.autoclass);
    print_run(&comparison.lifecycle);

    println!("\n--- Comparison ---");
    for insight in comparison.insights() {
        println!("- {}", insight);
    }
    println!("{}", comparison.summary.recommendation);

    let analyzer = Analyzer::new();
    for run in [&comparison.autoclass, &comparison.lifecycle] {
        let tiers = analyzer.analyze_tier_optimization(run.rows());
        println!(
            "{}: optimization score {:.1}, archive utilization {:.1}%",
            run.strategy(),
            tiers.optimization_score,
            tiers.archive_utilization
        );
    }

    Ok(())
}
