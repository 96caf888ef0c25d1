/////////
/// Live performance monitor
////////
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, Padding, Paragraph};
use ratatui::Frame;

use crate::telemetry::{MetricKind, Reading, Snapshot};

use super::common::titled_block;

pub(crate) fn draw_monitor(area: Rect, f: &mut Frame<'_>, snapshot: Option<&Snapshot>) {
    let Some(snapshot) = snapshot else {
        f.render_widget(
            Paragraph::new("Waiting for sensor data...").block(titled_block("Performance")),
            area,
        );
        return;
    };

    let mut constraints: Vec<Constraint> = snapshot
        .readings
        .iter()
        .map(|_| Constraint::Length(3))
        .collect();
    constraints.push(Constraint::Min(1));
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (idx, reading) in snapshot.readings.iter().enumerate() {
        f.render_widget(gauge_for(reading), layout[idx]);
    }

    let footer = Line::from(Span::styled(
        snapshot.status.clone(),
        Style::default().fg(Color::Gray),
    ));
    f.render_widget(Paragraph::new(footer), layout[snapshot.readings.len()]);
}

fn gauge_for(reading: &Reading) -> Gauge<'static> {
    Gauge::default()
        .block(titled_block(reading.kind.name()).padding(Padding::zero()))
        .gauge_style(Style::default().fg(color_for(reading)))
        .ratio((reading.percent / 100.0).clamp(0.0, 1.0))
        .label(Span::styled(reading.label.clone(), label_style(reading)))
}

// Values still moving toward their target are drawn bold
fn label_style(reading: &Reading) -> Style {
    if reading.settled {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    }
}

// Temperatures warm up in color as they climb
fn color_for(reading: &Reading) -> Color {
    match reading.kind {
        MetricKind::GpuTemp | MetricKind::CpuTemp if reading.value >= 65 => Color::Red,
        MetricKind::GpuTemp | MetricKind::CpuTemp if reading.value >= 55 => Color::Yellow,
        MetricKind::GpuTemp | MetricKind::CpuTemp => Color::Green,
        MetricKind::GpuLoad | MetricKind::CpuLoad => Color::Cyan,
        MetricKind::VramUsed | MetricKind::RamUsed => Color::Magenta,
    }
}
