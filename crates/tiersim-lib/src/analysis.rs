use crate::config::LifecycleRules;
use crate::data_structures::{
    bytes_to_gib, CostBreakdown, MonthlyResult, SimulationRun, StorageClass, Strategy, TierBytes,
};
use serde::Serialize;

/// Headline numbers for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostMetrics {
    pub total_cost: f64,
    pub components: CostBreakdown,
    pub avg_monthly_cost: f64,
}

/// Share of the total cost per component, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostShares {
    pub storage: f64,
    pub api: f64,
    pub retrieval: f64,
    pub early_deletion: f64,
    pub management_fee: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierOptimization {
    pub distribution: TierBytes,
    pub archive_utilization: f64,
    pub optimization_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthEfficiency {
    pub avg_cost_per_gib: f64,
    /// Mean cost per GiB in the second half minus the first half. Negative
    /// means each GiB got cheaper over time.
    pub cost_per_gib_trend: f64,
}

pub struct Analyzer;

impl Analyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_cost_metrics(&self, rows: &[MonthlyResult]) -> CostMetrics {
        let mut components = CostBreakdown::default();
        for row in rows {
            components += *row.costs();
        }
        let total_cost = components.total();
        let avg_monthly_cost = if rows.is_empty() {
            0.0
        } else {
            total_cost / rows.len() as f64
        };

        CostMetrics {
            total_cost,
            components,
            avg_monthly_cost,
        }
    }

    pub fn calculate_cost_shares(&self, rows: &[MonthlyResult]) -> CostShares {
        let metrics = self.calculate_cost_metrics(rows);
        let c = &metrics.components;
        let share = |part: f64| percent_of(part, metrics.total_cost);

        CostShares {
            storage: share(c.storage()),
            api: share(c.api()),
            retrieval: share(c.retrieval()),
            early_deletion: share(c.early_deletion()),
            management_fee: share(c.management_fee()),
        }
    }

    /// Bytes per class at the end of the run.
    pub fn final_distribution(&self, rows: &[MonthlyResult]) -> TierBytes {
        rows.last()
            .map(|row| row.tier_bytes())
            .unwrap_or_default()
    }

    /// Weighted share of cold data: archive counts fully, coldline 0.7,
    /// nearline 0.4. Capped at 100.
    pub fn analyze_tier_optimization(&self, rows: &[MonthlyResult]) -> TierOptimization {
        let distribution = self.final_distribution(rows);
        let total = distribution.total();
        let pct = |class: StorageClass| percent_of(distribution[class], total);

        let archive_utilization = pct(StorageClass::Archive);
        let optimization_score = (archive_utilization
            + 0.7 * pct(StorageClass::Coldline)
            + 0.4 * pct(StorageClass::Nearline))
        .min(100.0);

        TierOptimization {
            distribution,
            archive_utilization,
            optimization_score,
        }
    }

    pub fn analyze_growth_efficiency(&self, rows: &[MonthlyResult]) -> GrowthEfficiency {
        let per_gib: Vec<f64> = rows
            .iter()
            .map(|row| {
                let gib = bytes_to_gib(row.total_bytes());
                if gib > 0.0 {
                    row.total_cost() / gib
                } else {
                    0.0
                }
            })
            .collect();

        if per_gib.len() < 2 {
            return GrowthEfficiency {
                avg_cost_per_gib: mean(&per_gib),
                cost_per_gib_trend: 0.0,
            };
        }

        let (first, second) = per_gib.split_at(per_gib.len() / 2);
        GrowthEfficiency {
            avg_cost_per_gib: mean(&per_gib),
            cost_per_gib_trend: mean(second) - mean(first),
        }
    }

    pub fn generate_insights(&self, run: &SimulationRun) -> Vec<String> {
        let rows = run.rows();
        let shares = self.calculate_cost_shares(rows);
        let tiers = self.analyze_tier_optimization(rows);
        let mut insights = vec![format!(
            "Archive utilization: {:.1}%",
            tiers.archive_utilization
        )];

        match run.strategy() {
            Strategy::Autoclass => {
                insights.push(format!(
                    "Management fee impact: {:.1}% of total cost",
                    shares.management_fee
                ));
                if shares.management_fee > 15.0 {
                    insights.push(
                        "Management fees are a significant portion of costs".to_string(),
                    );
                } else if shares.management_fee < 5.0 {
                    insights.push("Management fees are minimal".to_string());
                }
            }
            Strategy::Lifecycle => {
                let access = shares.retrieval + shares.early_deletion;
                insights.push(format!(
                    "Retrieval and early-deletion impact: {:.1}% of total cost",
                    access
                ));
                if access > 20.0 {
                    insights.push(
                        "Access charges are a significant portion of costs".to_string(),
                    );
                } else if access < 5.0 {
                    insights.push("Access charges are low; transitions suit this data".to_string());
                }
            }
        }

        if run.is_truncated() {
            insights.push(format!(
                "Run stopped after {} months because a value overflowed",
                rows.len()
            ));
        }

        insights
    }

    /// `rules` names the Lifecycle path for path-specific advice.
    pub fn generate_recommendations(
        &self,
        run: &SimulationRun,
        rules: Option<&LifecycleRules>,
    ) -> Vec<String> {
        let rows = run.rows();
        let shares = self.calculate_cost_shares(rows);
        let tiers = self.analyze_tier_optimization(rows);
        let total = tiers.distribution.total();
        let standard_pct = percent_of(tiers.distribution[StorageClass::Standard], total);
        let coldline_pct = percent_of(tiers.distribution[StorageClass::Coldline], total);
        let mut recommendations = Vec::new();

        match run.strategy() {
            Strategy::Autoclass => {
                if tiers.archive_utilization < 30.0 {
                    recommendations.push(
                        "Little data reaches Archive; most of it is accessed too often to cool down"
                            .to_string(),
                    );
                }
                if shares.management_fee > 20.0 {
                    recommendations.push(
                        "High management fees; consider Lifecycle rules for predictable data"
                            .to_string(),
                    );
                }
            }
            Strategy::Lifecycle => {
                if let Some(rules) = rules {
                    recommendations.extend(path_recommendations(
                        rules,
                        standard_pct,
                        coldline_pct,
                        tiers.archive_utilization,
                    ));
                    if rules.terminal_class() != StorageClass::Archive {
                        recommendations.push(format!(
                            "The path ends in {}; adding an Archive step would lower storage cost for old data",
                            rules.terminal_class()
                        ));
                    }
                }
                if shares.retrieval + shares.early_deletion > 25.0 {
                    recommendations.push(
                        "High access charges; consider Autoclass for frequently read data"
                            .to_string(),
                    );
                }
            }
        }

        if standard_pct > 40.0 {
            recommendations.push(
                "Most data is still in Standard; consider faster transitions".to_string(),
            );
        }
        if tiers.archive_utilization > 80.0 {
            recommendations.push(
                "Excellent archive utilization; well suited to long-term storage".to_string(),
            );
        }

        if recommendations.is_empty() {
            recommendations.push("Current strategy looks well suited to this data".to_string());
        }

        recommendations
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Advice for the shape of a Lifecycle path, from the final distribution in
/// percent.
fn path_recommendations(
    rules: &LifecycleRules,
    standard_pct: f64,
    coldline_pct: f64,
    archive_pct: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    match (rules.nearline_days, rules.coldline_days, rules.archive_days) {
        // Standard straight to Archive
        (None, None, Some(_)) => {
            if standard_pct > 50.0 {
                recommendations.push(
                    "Consider a shorter wait before the Archive transition".to_string(),
                );
            } else {
                recommendations.push("Direct Archive transition is working efficiently".to_string());
            }
        }
        // Standard straight to Coldline, with or without Archive after it
        (None, Some(_), _) => {
            if coldline_pct > 60.0 {
                recommendations
                    .push("Coldline is effectively reducing storage costs".to_string());
            }
            if standard_pct > 30.0 {
                recommendations.push(
                    "Consider a faster transition to Coldline for additional savings".to_string(),
                );
            }
        }
        (Some(_), Some(_), Some(_)) => {
            if archive_pct < 30.0 {
                recommendations.push(
                    "Consider more aggressive transition timing; little data reaches Archive"
                        .to_string(),
                );
            } else {
                recommendations
                    .push("Balanced progression through all storage classes".to_string());
            }
        }
        _ => {}
    }

    recommendations
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
