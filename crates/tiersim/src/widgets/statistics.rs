use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};
use tiersim_engine::data_structures::bytes_to_gib;
use tiersim_engine::Strategy;

use crate::AppState;

pub struct StatisticsWidget;

impl StatisticsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let month_label = match state.selected_delta() {
            Some(delta) => format!("Month {} of {}", delta.month, state.month_count()),
            None if state.is_loading => "Simulating...".to_string(),
            None => "No results".to_string(),
        };

        let mut stats_text = vec![Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::White)),
            Span::styled(
                month_label,
                Style::default()
                    .fg(if state.comparison.is_some() {
                        Color::Green
                    } else {
                        Color::Red
                    })
                    .add_modifier(Modifier::BOLD),
            ),
        ])];

        for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
            stats_text.push(Self::strategy_line(state, strategy));
        }

        if let Some(error) = &state.error_message {
            stats_text.push(Line::from(vec![
                Span::styled("Error: ", Style::default().fg(Color::Red)),
                Span::styled(
                    error.chars().take(60).collect::<String>()
                        + if error.chars().count() > 60 { "..." } else { "" },
                    Style::default().fg(Color::Red),
                ),
            ]));
        } else {
            stats_text.push(Line::from(vec![
                Span::styled("Last Update: ", Style::default().fg(Color::White)),
                Span::styled(
                    state.last_update.format("%H:%M:%S UTC").to_string(),
                    Style::default().fg(Color::Cyan),
                ),
            ]));
        }

        let stats = Paragraph::new(stats_text)
            .block(Block::bordered().title("Statistics"))
            .alignment(Alignment::Left);

        frame.render_widget(stats, area);
    }

    fn strategy_line(state: &AppState, strategy: Strategy) -> Line<'static> {
        let Some(row) = state.selected_row(strategy) else {
            return Line::from(vec![
                Span::styled(format!("{}: ", strategy), Style::default().fg(Color::White)),
                Span::styled("N/A", Style::default().fg(Color::Gray)),
            ]);
        };

        Line::from(vec![
            Span::styled(format!("{}: ", strategy), Style::default().fg(Color::White)),
            Span::styled(
                format!("${:.2}", row.total_cost()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    " this month, ${:.2} to date, {:.1} GiB stored",
                    row.cumulative_cost(),
                    bytes_to_gib(row.total_bytes())
                ),
                Style::default().fg(Color::Gray),
            ),
        ])
    }
}
