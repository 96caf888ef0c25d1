use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::config;
use crate::coordinator::Coordinator;
use crate::detect::secure_boot_confirm_text;
use crate::drivers::KernelVariant;

use super::common::{controls_height, draw_controls, titled_block};

const CONFIRM_KEYS: [(&str, &str); 3] = [
    ("Up/Down", "choose the kernel module"),
    ("Enter", "start the installation"),
    ("Esc", "go back"),
];

const REMOVE_KEYS: [(&str, &str); 2] = [
    ("Y", "remove everything"),
    ("N/Esc", "keep drivers, go back"),
];

const VARIANTS: [(&str, KernelVariant); 2] = [
    ("Proprietary driver (akmod-nvidia)", KernelVariant::Proprietary),
    ("Open kernel module (Turing and newer)", KernelVariant::Open),
];

// Express install confirmation
pub(crate) fn draw_express_confirm(area: Rect, f: &mut Frame<'_>, coord: &Coordinator) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(controls_height(CONFIRM_KEYS.len())),
            Constraint::Length(9),
            Constraint::Min(5),
        ])
        .split(area);

    draw_controls(layout[0], f, &CONFIRM_KEYS);

    let version = coord
        .latest_version()
        .map(|v| format!("v{v} (Latest Stable)"))
        .unwrap_or_else(|| "not available yet".to_string());
    let secure_boot = coord
        .secure_boot()
        .map(secure_boot_confirm_text)
        .unwrap_or("detecting...");
    let label = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("GPU: ", label),
            Span::styled(config().host.gpu.as_str(), Style::default().fg(Color::Blue)),
        ]),
        Line::from(vec![
            Span::styled("Version: ", label),
            Span::styled(version, Style::default().fg(Color::Blue)),
        ]),
        Line::from(vec![
            Span::styled("Secure Boot: ", label),
            Span::styled(secure_boot, Style::default().fg(Color::Blue)),
        ]),
    ];
    if let Some(eula) = coord.express_variant().eula_notice() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(eula, Style::default().fg(Color::Gray))));
    }
    let details = Paragraph::new(lines)
        .block(titled_block("Confirm Express Install"))
        .wrap(Wrap { trim: false });
    f.render_widget(details, layout[1]);

    let items: Vec<ListItem> = VARIANTS
        .iter()
        .enumerate()
        .map(|(idx, (label, _))| ListItem::new(Line::from(format!("{:>2}) {}", idx + 1, label))))
        .collect();
    let list = List::new(items)
        .block(titled_block("Kernel module"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let cursor = VARIANTS
        .iter()
        .position(|(_, variant)| *variant == coord.express_variant())
        .unwrap_or(0);
    let mut state = ListState::default();
    state.select(Some(cursor));
    f.render_stateful_widget(list, layout[2], &mut state);
}

// Yes/no gate in front of the remove-all run
pub(crate) fn draw_remove_confirm(area: Rect, f: &mut Frame<'_>, coord: &Coordinator) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(controls_height(REMOVE_KEYS.len())),
            Constraint::Min(7),
        ])
        .split(area);

    draw_controls(layout[0], f, &REMOVE_KEYS);

    let version = coord
        .expert()
        .selected_version
        .as_deref()
        .map(|v| format!("v{v}"))
        .unwrap_or_else(|| "none selected".to_string());
    let question = Paragraph::new(vec![
        Line::from(Span::styled(
            "Remove all NVIDIA drivers and revert to nouveau?",
            Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "Reinstall version: ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(version),
        ]),
        Line::from("Old packages and driver configs are purged (deep clean)."),
    ])
    .block(titled_block("Remove All"))
    .wrap(Wrap { trim: false });
    f.render_widget(question, layout[1]);
}
