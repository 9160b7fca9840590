use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Gauge},
    Frame,
};
use tiersim_engine::StorageClass;

use crate::AppState;

/// Share of bytes per storage class in the selected month.
pub struct TierBarsWidget;

impl TierBarsWidget {
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(area);

        let row = state.selected_row(state.view);
        for (index, class) in StorageClass::ALL.into_iter().enumerate() {
            let share = row
                .filter(|row| row.total_bytes() > 0.0)
                .map(|row| row.bytes_in(class) / row.total_bytes() * 100.0)
                .unwrap_or(0.0);

            let gauge = Gauge::default()
                .block(Block::bordered().title(format!("{} ({})", class, state.view)))
                .gauge_style(Style::default().fg(Self::class_color(class)))
                .percent(share.clamp(0.0, 100.0) as u16)
                .label(format!("{:.1}%", share));

            frame.render_widget(gauge, chunks[index]);
        }
    }

    fn class_color(class: StorageClass) -> Color {
        match class {
            StorageClass::Standard => Color::Red,
            StorageClass::Nearline => Color::Yellow,
            StorageClass::Coldline => Color::Cyan,
            StorageClass::Archive => Color::Blue,
        }
    }
}
