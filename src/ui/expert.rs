use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::coordinator::Coordinator;

use super::common::{controls_height, draw_controls, titled_block};

const EXPERT_KEYS: [(&str, &str); 5] = [
    ("Up/Down", "move, Space to select a version"),
    ("O", "toggle open kernel module, D to toggle deep clean"),
    ("I", "install the selected version"),
    ("X", "remove all drivers and reinstall (asks first)"),
    ("Esc", "go back"),
];

// Custom install: version catalog plus options
pub(crate) fn draw_expert(area: Rect, f: &mut Frame<'_>, coord: &Coordinator) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(controls_height(EXPERT_KEYS.len())),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(area);

    draw_controls(layout[0], f, &EXPERT_KEYS);

    let form = coord.expert();
    let items: Vec<ListItem> = coord
        .catalog()
        .iter()
        .map(|entry| {
            let selected = form.selected_version.as_deref() == Some(entry.version.as_str());
            let mut spans = vec![
                Span::raw(if selected { "(*) " } else { "( ) " }),
                Span::styled(
                    format!("{:<12}", entry.version),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{:<12}", entry.source),
                    Style::default().fg(Color::Blue),
                ),
            ];
            if entry.latest {
                spans.push(Span::styled(
                    "Latest ",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ));
            }
            spans.push(Span::styled(
                entry.notes.clone(),
                Style::default().fg(Color::Gray),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();
    let list = List::new(items)
        .block(titled_block("Driver versions"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default();
    state.select(Some(form.cursor));
    f.render_stateful_widget(list, layout[1], &mut state);

    let options = Paragraph::new(vec![
        option_line(form.open_kernel, "Open kernel module (nvidia-open)"),
        option_line(form.deep_clean, "Deep clean previous driver configs"),
    ])
    .block(titled_block("Options"));
    f.render_widget(options, layout[2]);
}

fn option_line(enabled: bool, label: &str) -> Line<'static> {
    let (mark, style) = if enabled {
        ("[x]", Style::default().fg(Color::Green))
    } else {
        ("[ ]", Style::default().fg(Color::White))
    };
    Line::from(vec![
        Span::styled(mark, style),
        Span::raw(format!(" {label}")),
    ])
}
