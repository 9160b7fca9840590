use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
    Frame,
};
use tiersim_engine::data_structures::bytes_to_gib;
use tiersim_engine::{MonthlyResult, StorageClass, Strategy};

use crate::AppState;

pub struct PopupWidget;

impl PopupWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let popup_area = Self::centered_rect(70, 80, area);

        frame.render_widget(Clear, popup_area);

        let title = match state.selected_delta() {
            Some(delta) => format!("Month {} Breakdown", delta.month),
            None => "Month Breakdown".to_string(),
        };

        let popup = Paragraph::new(Self::create_month_breakdown_text(state))
            .block(
                Block::bordered()
                    .title(title)
                    .title_alignment(Alignment::Center)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Left);

        frame.render_widget(popup, popup_area);
    }

    fn create_month_breakdown_text(state: &AppState) -> Vec<Line<'static>> {
        let mut text = Vec::new();

        for strategy in [Strategy::Autoclass, Strategy::Lifecycle] {
            text.push(Line::from(Span::styled(
                format!("{}:", strategy),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));

            match state.selected_row(strategy) {
                Some(row) => text.extend(Self::row_lines(row)),
                None => text.push(Line::from("  no data")),
            }
            text.push(Line::from(" "));
        }

        text.push(Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "d",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to close", Style::default().fg(Color::Gray)),
        ]));

        text
    }

    fn row_lines(row: &MonthlyResult) -> Vec<Line<'static>> {
        let costs = row.costs();
        let entry = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("  {:<16}", label), Style::default().fg(Color::White)),
                Span::styled(value, Style::default().fg(Color::Yellow)),
            ])
        };

        let mut lines: Vec<Line<'static>> = StorageClass::ALL
            .into_iter()
            .map(|class| entry(class.name(), format!("{:.1} GiB", bytes_to_gib(row.bytes_in(class)))))
            .collect();

        lines.extend([
            entry("Storage", format!("${:.2}", costs.storage())),
            entry("Retrieval", format!("${:.2}", costs.retrieval())),
            entry("Early deletion", format!("${:.2}", costs.early_deletion())),
            entry("API operations", format!("${:.2}", costs.api())),
            entry("Management fee", format!("${:.2}", costs.management_fee())),
            entry("Total", format!("${:.2}", row.total_cost())),
        ]);
        lines
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}
