/////////
/// Installation progress screen
////////
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::Frame;

use crate::model::{App, Step, StepStatus};
use crate::ui::colors::PURE_WHITE;

use super::SPINNER;

// Installation progress UI
pub(crate) fn draw_progress(area: Rect, f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),                          // Title
            Constraint::Length(3),                          // Progress bar
            Constraint::Length(app.steps.len() as u16 + 2), // Installation steps
            Constraint::Min(6),                             // Logs
            Constraint::Length(1),                          // Final status
        ])
        .split(area);

    // Run title
    let title = Line::from(vec![
        Span::raw("/- "),
        Span::styled(
            app.title.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" -/"),
    ]);
    f.render_widget(Paragraph::new(title), layout[0]);

    // Overall progress bar
    let progress = Gauge::default()
        .block(plain_block("Progress"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(u16::from(app.progress.min(100)));
    f.render_widget(progress, layout[1]);

    // List of installation steps
    let step_lines: Vec<Line> = app
        .steps
        .iter()
        .map(|step| render_step(step, app.spinner_idx))
        .collect();
    let steps = Paragraph::new(step_lines)
        .block(plain_block("Steps"))
        .wrap(Wrap { trim: false });
    f.render_widget(steps, layout[2]);

    // Log output panel, pinned to the newest line
    let log_lines: Vec<Line> = app
        .logs
        .iter()
        .map(|line| Line::from(Span::raw(line.clone())))
        .collect();
    let log_height = layout[3].height.saturating_sub(2) as usize;
    let scroll_offset = log_lines.len().saturating_sub(log_height);
    let scroll_offset = scroll_offset.min(u16::MAX as usize) as u16;
    let logs = Paragraph::new(log_lines)
        .block(plain_block("Logs"))
        .scroll((scroll_offset, 0));
    f.render_widget(logs, layout[3]);

    // Final status message at the bottom when the installation is done
    let status_line = if app.done {
        Line::from(vec![
            Span::styled(
                "Installation complete.",
                Style::default().fg(Color::LightGreen),
            ),
            Span::raw(" "),
            Span::styled(
                "Press D when done, R to reboot.",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Esc returns to the menu; the installation keeps running.",
            Style::default().fg(Color::Gray),
        ))
    };
    f.render_widget(Paragraph::new(status_line), layout[4]);
}

fn plain_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Black))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(PURE_WHITE).add_modifier(Modifier::BOLD),
        ))
}

fn render_step(step: &Step, spinner_idx: usize) -> Line<'static> {
    let icon = match step.status {
        StepStatus::Pending => "[ ]",
        StepStatus::Running => "[..]",
        StepStatus::Done => "[OK]",
    };

    let mut spans = vec![
        Span::styled(
            format!("{} {}", icon, step.name),
            style_for_status(step.status),
        ),
        Span::styled(format!("  <{}>", step.tag), Style::default().fg(Color::Blue)),
    ];

    // Add a spinner if the step is currently running
    if step.status == StepStatus::Running {
        spans.push(Span::raw(format!(" {}", SPINNER[spinner_idx % SPINNER.len()])));
    }

    Line::from(spans)
}

// Returns a style (color) for a given step status
fn style_for_status(status: StepStatus) -> Style {
    match status {
        StepStatus::Pending => Style::default().fg(Color::White),
        StepStatus::Running => Style::default().fg(Color::Yellow),
        StepStatus::Done => Style::default().fg(Color::Green),
    }
}
