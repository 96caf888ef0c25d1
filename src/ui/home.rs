/////////
/// Landing page: express/custom entry points and the Secure Boot banner
////////
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::coordinator::Coordinator;
use crate::detect::secure_boot_banner;
use crate::ui::colors::{AMBER, EMERALD};

use super::common::{controls_height, draw_controls, titled_block};

const HOME_KEYS: [(&str, &str); 5] = [
    ("E", "express install (latest driver)"),
    ("C", "custom install (choose version and options)"),
    ("P", "back to the last installation"),
    ("M", "performance monitor"),
    ("Ctrl+Q", "quit"),
];

pub(crate) fn draw_home(area: Rect, f: &mut Frame<'_>, coord: &Coordinator) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(controls_height(HOME_KEYS.len())),
            Constraint::Length(5),
            Constraint::Min(5),
        ])
        .split(area);

    draw_controls(layout[0], f, &HOME_KEYS);

    let express = match coord.latest_version() {
        Some(version) => Line::from(vec![
            Span::raw("Recommended driver: "),
            Span::styled(
                format!("v{version}"),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" (Latest Stable)"),
        ]),
        None => Line::from(Span::styled(
            "Looking up the latest driver...",
            Style::default().fg(Color::Gray),
        )),
    };
    f.render_widget(
        Paragraph::new(express).block(titled_block("Express Install")),
        layout[1],
    );

    let banner = match coord.secure_boot() {
        Some(enabled) => {
            let (title, desc) = secure_boot_banner(enabled);
            let color = if enabled { AMBER } else { EMERALD };
            vec![
                Line::from(Span::styled(
                    title,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(desc),
            ]
        }
        None => vec![Line::from(Span::styled(
            "Checking Secure Boot state...",
            Style::default().fg(Color::Gray),
        ))],
    };
    f.render_widget(
        Paragraph::new(banner)
            .block(titled_block("Secure Boot"))
            .wrap(Wrap { trim: false }),
        layout[2],
    );
}
