//! Side-by-side runs of both strategies over the same ingestion schedule.

use crate::data_structures::{SimulationRun, Strategy};
use crate::error::Result;
use crate::policy::policy_for;
use crate::simulator::Simulator;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Cost differences below this many dollars are reported as similar.
pub const SIMILAR_COST_THRESHOLD: f64 = 1000.0;

/// Which strategy is cheaper so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Leader {
    Autoclass,
    Lifecycle,
    Tie,
}

impl Leader {
    /// Leader for a cumulative Autoclass − Lifecycle delta.
    pub fn from_delta(delta: f64) -> Self {
        if delta < 0.0 {
            Leader::Autoclass
        } else if delta > 0.0 {
            Leader::Lifecycle
        } else {
            Leader::Tie
        }
    }

    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Leader::Autoclass => Some(Strategy::Autoclass),
            Leader::Lifecycle => Some(Strategy::Lifecycle),
            Leader::Tie => None,
        }
    }
}

impl fmt::Display for Leader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy() {
            Some(strategy) => write!(f, "{}", strategy),
            None => f.write_str("Tie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRow {
    pub month: u32,
    pub autoclass_total: f64,
    pub lifecycle_total: f64,
    /// Autoclass − Lifecycle for the month.
    pub monthly_delta: f64,
    pub cumulative_delta: f64,
    pub leader: Leader,
    pub leader_changed: bool,
}

/// The cheaper strategy changed hands in `month`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Crossover {
    pub month: u32,
    pub from: Leader,
    pub to: Leader,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub winner: Leader,
    pub autoclass_cost: f64,
    pub lifecycle_cost: f64,
    /// |Autoclass − Lifecycle| over the compared months.
    pub cost_difference: f64,
    /// Difference as a share of the more expensive total.
    pub savings_percent: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub autoclass: SimulationRun,
    pub lifecycle: SimulationRun,
    pub deltas: Vec<DeltaRow>,
    pub crossovers: Vec<Crossover>,
    pub summary: ComparisonSummary,
}

impl Comparison {
    pub fn first_crossover(&self) -> Option<&Crossover> {
        self.crossovers.first()
    }

    pub fn run(&self, strategy: Strategy) -> &SimulationRun {
        match strategy {
            Strategy::Autoclass => &self.autoclass,
            Strategy::Lifecycle => &self.lifecycle,
        }
    }

    /// Comparison talking points, winner first.
    pub fn insights(&self) -> Vec<String> {
        let mut insights = Vec::new();
        let summary = &self.summary;

        match summary.winner.strategy() {
            Some(winner) => insights.push(format!(
                "{} is more cost-effective (saves {:.1}%)",
                winner, summary.savings_percent
            )),
            None => insights.push("Both strategies cost the same".to_string()),
        }

        let fee: f64 = self
            .autoclass
            .rows()
            .iter()
            .map(|row| row.costs().management_fee())
            .sum();
        let access: f64 = self
            .lifecycle
            .rows()
            .iter()
            .map(|row| row.costs().retrieval() + row.costs().early_deletion())
            .sum();
        insights.push(format!(
            "Autoclass management fee: {:.1}% of total cost",
            percent_of(fee, summary.autoclass_cost)
        ));
        insights.push(format!(
            "Lifecycle retrieval and early-deletion costs: {:.1}% of total cost",
            percent_of(access, summary.lifecycle_cost)
        ));

        match self.crossovers.as_slice() {
            [] => {}
            [only] => insights.push(format!(
                "{} overtakes {} in month {}",
                only.to, only.from, only.month
            )),
            [first, ..] => insights.push(format!(
                "The lead changes {} times, first in month {} ({} → {})",
                self.crossovers.len(),
                first.month,
                first.from,
                first.to
            )),
        }

        match summary.winner {
            Leader::Lifecycle => insights.push(
                "Lifecycle wins on predictable data: no management fee and no re-promotion"
                    .to_string(),
            ),
            Leader::Autoclass => insights.push(
                "Autoclass wins on accessed data: no retrieval or early-deletion charges"
                    .to_string(),
            ),
            Leader::Tie => {}
        }

        insights
    }
}

/// Runs both strategies against the same inputs.
pub struct Comparator {
    simulator: Simulator,
}

impl Comparator {
    pub fn new(simulator: Simulator) -> Self {
        Self { simulator }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn compare(&self) -> Result<Comparison> {
        let config = self.simulator.config();
        let pricing = self.simulator.pricing();
        let autoclass_policy = policy_for(Strategy::Autoclass, config, pricing)?;
        let lifecycle_policy = policy_for(Strategy::Lifecycle, config, pricing)?;

        let schedule = self.simulator.schedule();
        let autoclass = self
            .simulator
            .run_with_schedule(autoclass_policy.as_ref(), &schedule);
        let lifecycle = self
            .simulator
            .run_with_schedule(lifecycle_policy.as_ref(), &schedule);

        let (deltas, crossovers) = self.calculate_deltas(&autoclass, &lifecycle);
        for crossover in &crossovers {
            info!(
                month = crossover.month,
                from = %crossover.from,
                to = %crossover.to,
                "cheaper strategy changed"
            );
        }

        let summary = self.summarize(&deltas);
        info!(
            winner = %summary.winner,
            difference = summary.cost_difference,
            "comparison finished"
        );

        Ok(Comparison {
            autoclass,
            lifecycle,
            deltas,
            crossovers,
            summary,
        })
    }

    /// Per-month deltas over the months both runs reached. Moves into or out
    /// of a tie flag `leader_changed` but only a change between the two
    /// strategies counts as a crossover.
    pub fn calculate_deltas(
        &self,
        autoclass: &SimulationRun,
        lifecycle: &SimulationRun,
    ) -> (Vec<DeltaRow>, Vec<Crossover>) {
        let mut deltas = Vec::with_capacity(autoclass.rows().len());
        let mut crossovers = Vec::new();
        let mut previous: Option<Leader> = None;
        let mut last_strict: Option<Leader> = None;

        for (a, l) in autoclass.rows().iter().zip(lifecycle.rows()) {
            let cumulative_delta = a.cumulative_cost() - l.cumulative_cost();
            let leader = Leader::from_delta(cumulative_delta);
            let leader_changed = previous.is_some_and(|previous| previous != leader);

            if leader != Leader::Tie {
                if let Some(from) = last_strict.filter(|from| *from != leader) {
                    crossovers.push(Crossover {
                        month: a.month(),
                        from,
                        to: leader,
                    });
                }
                last_strict = Some(leader);
            }

            deltas.push(DeltaRow {
                month: a.month(),
                autoclass_total: a.total_cost(),
                lifecycle_total: l.total_cost(),
                monthly_delta: a.total_cost() - l.total_cost(),
                cumulative_delta,
                leader,
                leader_changed,
            });
            previous = Some(leader);
        }

        (deltas, crossovers)
    }

    pub fn summarize(&self, deltas: &[DeltaRow]) -> ComparisonSummary {
        let autoclass_cost: f64 = deltas.iter().map(|row| row.autoclass_total).sum();
        let lifecycle_cost: f64 = deltas.iter().map(|row| row.lifecycle_total).sum();
        let difference = deltas
            .last()
            .map(|row| row.cumulative_delta)
            .unwrap_or(0.0);
        let winner = Leader::from_delta(difference);
        let savings_percent = percent_of(difference.abs(), autoclass_cost.max(lifecycle_cost));

        ComparisonSummary {
            winner,
            autoclass_cost,
            lifecycle_cost,
            cost_difference: difference.abs(),
            savings_percent,
            recommendation: recommendation(difference, savings_percent),
        }
    }
}

fn recommendation(difference: f64, savings_percent: f64) -> String {
    if difference.abs() < SIMILAR_COST_THRESHOLD {
        "Costs are similar; choose based on operational preferences".to_string()
    } else if difference > 0.0 {
        format!(
            "Lifecycle recommended: saves {:.1}% by avoiding the management fee",
            savings_percent
        )
    } else {
        format!(
            "Autoclass recommended: saves {:.1}% through access-driven tiering",
            savings_percent
        )
    }
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
