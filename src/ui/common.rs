use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::Frame;

use crate::coordinator::{Coordinator, Page};
use crate::detect::secure_boot_label;
use crate::ui::colors::{AMBER, EMERALD, PURE_WHITE};

use super::{confirm, expert, home, installer, monitor, BANNER_ART};

// Draws the whole screen for the current page
pub fn draw_ui(area: Rect, f: &mut Frame<'_>, coord: &Coordinator) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(BANNER_ART.len() as u16), // ASCII art
            Constraint::Length(1),                       // Navigation
            Constraint::Length(1),                       // Spacer
            Constraint::Min(8),                          // Page body
            Constraint::Length(1),                       // Status bar
        ])
        .split(area);

    let art_lines: Vec<Line> = BANNER_ART
        .iter()
        .map(|line| {
            Line::from(Span::styled(
                *line,
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(art_lines), layout[0]);

    f.render_widget(Paragraph::new(nav_line(coord.page())), layout[1]);

    match coord.page() {
        Page::Install => home::draw_home(layout[3], f, coord),
        Page::ExpressConfirm => confirm::draw_express_confirm(layout[3], f, coord),
        Page::Expert => expert::draw_expert(layout[3], f, coord),
        Page::RemoveConfirm => confirm::draw_remove_confirm(layout[3], f, coord),
        Page::Progress => installer::draw_progress(layout[3], f, coord.app()),
        Page::Monitor => monitor::draw_monitor(layout[3], f, coord.snapshot()),
    }

    f.render_widget(Paragraph::new(status_line(coord)), layout[4]);
}

// Confirmation and progress pages belong to the install tab
fn nav_line(page: Page) -> Line<'static> {
    let active = match page {
        Page::Install | Page::ExpressConfirm | Page::Progress => 0,
        Page::Expert | Page::RemoveConfirm => 1,
        Page::Monitor => 2,
    };
    let tabs = ["1 Install", "2 Expert", "3 Monitor"];
    let mut spans = Vec::with_capacity(tabs.len() * 2);
    for (idx, tab) in tabs.iter().enumerate() {
        if idx == active {
            spans.push(Span::raw("/- "));
            spans.push(Span::styled(
                *tab,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" -/ "));
        } else {
            spans.push(Span::styled(
                format!("   {tab}    "),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    Line::from(spans)
}

fn status_line(coord: &Coordinator) -> Line<'static> {
    let secure_boot = match coord.secure_boot() {
        Some(true) => Span::styled(secure_boot_label(true), Style::default().fg(AMBER)),
        Some(false) => Span::styled(secure_boot_label(false), Style::default().fg(EMERALD)),
        None => Span::styled("Detecting Secure Boot...", Style::default().fg(Color::Gray)),
    };
    let version = coord
        .latest_version()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "checking...".to_string());

    let mut spans = vec![
        secure_boot,
        Span::raw("  |  "),
        Span::styled("Driver: ", Style::default().fg(Color::Cyan)),
        Span::raw(version),
    ];
    if let Some((version, step, total)) = coord.run_position() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("Installing v{version}: step {step}/{total}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(notice) = coord.notice() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::LightRed),
        ));
    }
    Line::from(spans)
}

// Bordered block with the bracketed title used on every page
pub(crate) fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Black))
        .padding(Padding::new(1, 0, 1, 0))
        .title(Line::from(vec![
            Span::styled("[", Style::default().fg(Color::Black)),
            Span::styled(
                format!(" {title} "),
                Style::default().fg(PURE_WHITE).add_modifier(Modifier::BOLD),
            ),
            Span::styled("]", Style::default().fg(Color::Black)),
        ]))
}

// Box of key hints; `keys` are (key, action) pairs
pub(crate) fn draw_controls(area: Rect, f: &mut Frame<'_>, keys: &[(&str, &str)]) {
    let lines: Vec<Line> = keys
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(key.to_string(), Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {action}")),
            ])
        })
        .collect();
    let controls = Paragraph::new(lines)
        .block(titled_block("Controls"))
        .wrap(Wrap { trim: false });
    f.render_widget(controls, area);
}

pub(crate) fn controls_height(keys: usize) -> u16 {
    (keys as u16).saturating_add(3)
}
