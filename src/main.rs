mod config;
mod coordinator;
mod detect;
mod drivers;
mod installer;
mod logging;
mod model;
mod telemetry;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, ClearType};
use crossterm::{cursor, execute, terminal::Clear};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::{config, EnvOverrides};
use crate::coordinator::{Coordinator, Page};
use crate::installer::RunState;
use crate::logging::{append_log_file, open_log_file};
use crate::ui::{draw_ui, SPINNER_LEN};

const SPINNER_INTERVAL: Duration = Duration::from_millis(120);

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let overrides = EnvOverrides::from_env();

    // Parse the embedded catalog before touching the terminal
    let _ = config();

    let log_path = overrides.log_path().to_string();
    let mut coord = Coordinator::new(&overrides, open_log_file(&log_path), Instant::now());
    if coord.app().log_file.is_some() {
        let line = format!("Logging to {}", log_path);
        append_log_file(&mut coord.app_mut().log_file, &line);
    }

    // Set up the terminal for TUI interaction
    enable_raw_mode().context("enable raw mode")?;
    clear_screen()?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(io::stdout())).context("init terminal")?;
    terminal.clear().context("clear terminal")?;

    let result = run(&mut terminal, &mut coord);

    // Clean up the terminal before exiting
    disable_raw_mode().context("disable raw mode")?;
    let _ = clear_screen();
    result
}

// Cooperative loop: draw, wait for input up to one frame, advance the session
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    coord: &mut Coordinator,
) -> Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| draw_ui(f.size(), f, coord))?;

        let timeout = coord.poll_interval(Instant::now());
        if event::poll(timeout).context("poll events")? {
            if let Event::Key(key) = event::read().context("read event")? {
                if key.kind == KeyEventKind::Press && handle_key(coord, key, Instant::now()) {
                    return Ok(());
                }
            }
        }

        coord.update(Instant::now());

        // Update the spinner animation
        if last_tick.elapsed() >= SPINNER_INTERVAL {
            let app = coord.app_mut();
            app.spinner_idx = (app.spinner_idx + 1) % SPINNER_LEN;
            last_tick = Instant::now();
        }
    }
}

// Returns true when the user asked to quit
fn handle_key(coord: &mut Coordinator, key: KeyEvent, now: Instant) -> bool {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        && key.modifiers.contains(KeyModifiers::CONTROL)
    {
        return true;
    }

    match key.code {
        KeyCode::Char('1') => return show(coord, Page::Install, now),
        KeyCode::Char('2') => return show(coord, Page::Expert, now),
        KeyCode::Char('3') => return show(coord, Page::Monitor, now),
        _ => {}
    }

    match coord.page() {
        Page::Install => match key.code {
            KeyCode::Char('e') | KeyCode::Char('E') => coord.show_page(Page::ExpressConfirm, now),
            KeyCode::Char('c') | KeyCode::Char('C') => coord.show_page(Page::Expert, now),
            KeyCode::Char('m') | KeyCode::Char('M') => coord.show_page(Page::Monitor, now),
            KeyCode::Char('p') | KeyCode::Char('P') if coord.run_state() != RunState::Idle => {
                coord.show_page(Page::Progress, now)
            }
            _ => {}
        },
        Page::ExpressConfirm => match key.code {
            KeyCode::Up | KeyCode::Down => coord.toggle_express_variant(),
            KeyCode::Enter => coord.express_install(now),
            KeyCode::Esc => coord.show_page(Page::Install, now),
            _ => {}
        },
        Page::Expert => match key.code {
            KeyCode::Up => coord.move_cursor(false),
            KeyCode::Down => coord.move_cursor(true),
            KeyCode::Char(' ') | KeyCode::Enter => coord.select_cursor(),
            KeyCode::Char('o') | KeyCode::Char('O') => coord.toggle_open_kernel(),
            KeyCode::Char('d') | KeyCode::Char('D') => coord.toggle_deep_clean(),
            KeyCode::Char('i') | KeyCode::Char('I') => coord.custom_install(now),
            KeyCode::Char('x') | KeyCode::Char('X') => coord.request_remove_all(now),
            KeyCode::Esc => coord.show_page(Page::Install, now),
            _ => {}
        },
        Page::RemoveConfirm => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => coord.confirm_remove_all(now),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                coord.show_page(Page::Expert, now)
            }
            _ => {}
        },
        Page::Progress => match key.code {
            KeyCode::Char('d') | KeyCode::Char('D') if coord.app().done => {
                coord.show_page(Page::Install, now)
            }
            KeyCode::Char('r') | KeyCode::Char('R') if coord.app().done => {
                coord.set_notice("System would reboot now (simulation, nothing was executed).")
            }
            KeyCode::Esc => coord.show_page(Page::Install, now),
            _ => {}
        },
        Page::Monitor => {
            if key.code == KeyCode::Esc {
                coord.show_page(Page::Install, now);
            }
        }
    }
    false
}

fn show(coord: &mut Coordinator, page: Page, now: Instant) -> bool {
    coord.show_page(page, now);
    false
}

// Clear the terminal screen
fn clear_screen() -> Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0)).context("clear screen")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(coord: &mut Coordinator, code: KeyCode, now: Instant) -> bool {
        handle_key(coord, KeyEvent::new(code, KeyModifiers::NONE), now)
    }

    fn ready_on_expert() -> (Coordinator, Instant) {
        let overrides = EnvOverrides {
            seed: Some(9),
            log_path: None,
            secure_boot: Some(false),
        };
        let base = Instant::now();
        let mut coord = Coordinator::new(&overrides, None, base);
        let now = base + Duration::from_secs(1);
        coord.update(now);
        press(&mut coord, KeyCode::Char('2'), now);
        (coord, now)
    }

    #[test]
    fn single_x_only_asks() {
        let (mut coord, now) = ready_on_expert();
        assert!(!press(&mut coord, KeyCode::Char('x'), now));
        assert_eq!(coord.page(), Page::RemoveConfirm);
        assert_eq!(coord.run_state(), RunState::Idle);

        press(&mut coord, KeyCode::Char('n'), now);
        assert_eq!(coord.page(), Page::Expert);
        assert_eq!(coord.run_state(), RunState::Idle);

        press(&mut coord, KeyCode::Char('x'), now);
        press(&mut coord, KeyCode::Esc, now);
        assert_eq!(coord.page(), Page::Expert);
        assert_eq!(coord.run_state(), RunState::Idle);
    }

    #[test]
    fn y_starts_the_deep_clean_run() {
        let (mut coord, now) = ready_on_expert();
        press(&mut coord, KeyCode::Char('X'), now);
        press(&mut coord, KeyCode::Char('y'), now);
        assert_eq!(coord.page(), Page::Progress);
        assert_eq!(coord.run_state(), RunState::Running);
        assert_eq!(coord.app().steps.len(), 9);
    }

    #[test]
    fn ctrl_q_quits_from_any_page() {
        let (mut coord, now) = ready_on_expert();
        press(&mut coord, KeyCode::Char('x'), now);
        let quit = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(handle_key(&mut coord, quit, now));
    }
}
