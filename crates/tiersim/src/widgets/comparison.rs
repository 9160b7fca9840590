use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};
use tiersim_engine::Leader;

use crate::AppState;

pub struct ComparisonWidget;

impl ComparisonWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut lines = Vec::new();

        if let Some(comparison) = &state.comparison {
            let summary = &comparison.summary;

            if let Some(delta) = state.selected_delta() {
                lines.push(Line::from(vec![
                    Span::styled("Leader so far: ", Style::default().fg(Color::White)),
                    Span::styled(
                        delta.leader.to_string(),
                        Style::default()
                            .fg(Self::leader_color(delta.leader))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" (cumulative delta ${:.2})", delta.cumulative_delta),
                        Style::default().fg(Color::Gray),
                    ),
                ]));
            }

            let crossovers = if comparison.crossovers.is_empty() {
                "none".to_string()
            } else {
                comparison
                    .crossovers
                    .iter()
                    .map(|crossover| format!("month {} ({})", crossover.month, crossover.to))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            lines.push(Line::from(vec![
                Span::styled("Crossovers: ", Style::default().fg(Color::White)),
                Span::styled(crossovers, Style::default().fg(Color::Magenta)),
            ]));

            lines.push(Line::from(vec![
                Span::styled("Total: ", Style::default().fg(Color::White)),
                Span::styled(
                    format!(
                        "Autoclass ${:.2} vs Lifecycle ${:.2} ({:.1}% apart)",
                        summary.autoclass_cost, summary.lifecycle_cost, summary.savings_percent
                    ),
                    Style::default().fg(Color::Yellow),
                ),
            ]));

            lines.push(Line::from(Span::styled(
                summary.recommendation.clone(),
                Style::default()
                    .fg(Self::leader_color(summary.winner))
                    .add_modifier(Modifier::BOLD),
            )));

            lines.push(Line::from(" "));
            for insight in comparison.insights() {
                lines.push(Line::from(vec![
                    Span::styled("• ", Style::default().fg(Color::Cyan)),
                    Span::styled(insight, Style::default().fg(Color::White)),
                ]));
            }
        } else {
            lines.push(Line::from(Span::styled(
                "No comparison available",
                Style::default().fg(Color::Gray),
            )));
        }

        let widget = Paragraph::new(lines)
            .block(Block::bordered().title("Autoclass vs Lifecycle"))
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });

        frame.render_widget(widget, area);
    }

    fn leader_color(leader: Leader) -> Color {
        match leader {
            Leader::Autoclass => Color::Green,
            Leader::Lifecycle => Color::Blue,
            Leader::Tie => Color::Gray,
        }
    }
}
