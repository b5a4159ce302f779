//! Interactive full-screen call tree browser.
//!
//! The browser consumes the lazy tree nodes directly: rows for a branch are
//! created when it is expanded and dropped when it is collapsed.

pub mod app;
pub mod ui;

use crate::graph::CallGraph;
use crate::tree::TreeNode;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

pub use app::{Browser, Row};
pub use ui::Header;

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Run the browser until the user quits
///
/// The terminal is restored before returning, also when the loop fails.
pub fn run(graph: &CallGraph, source: &str, path_depth: usize) -> Result<()> {
    let roots: Vec<TreeNode<'_>> = TreeNode::roots(graph)
        .into_iter()
        .map(|node| node.with_path_depth(path_depth))
        .collect();
    let mut browser = Browser::new(roots);
    let header = Header {
        source: source.to_string(),
        functions: graph.len(),
        roots: graph.roots().len(),
    };

    enable_raw_mode().context("Failed to enable raw terminal mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to enter alternate screen");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = event_loop(&mut terminal, &mut browser, &header);

    // Always restore terminal before returning.
    let raw = disable_raw_mode();
    let screen = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let cursor = terminal.show_cursor();

    result?;
    raw.and(screen)
        .and(cursor)
        .context("Failed to restore terminal")
}

fn event_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    browser: &mut Browser<'_>,
    header: &Header,
) -> Result<()> {
    loop {
        let mut page = 1;
        terminal.draw(|frame| {
            page = ui::page_size(frame.area());
            ui::render(frame, browser, header);
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key(browser, key, page)? == Action::Quit {
                break;
            }
        }
    }
    Ok(())
}

/// Apply one key press to the browser state
pub fn handle_key(browser: &mut Browser<'_>, key: KeyEvent, page: usize) -> Result<Action> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(Action::Quit)
        }
        KeyCode::Down | KeyCode::Char('j') => browser.move_down(),
        KeyCode::Up | KeyCode::Char('k') => browser.move_up(),
        KeyCode::PageDown => browser.page_down(page),
        KeyCode::PageUp => browser.page_up(page),
        KeyCode::Home => browser.home(),
        KeyCode::End => browser.end(),
        KeyCode::Enter => browser.toggle().context("Failed to expand row")?,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('e') => {
            browser.expand().context("Failed to expand row")?
        }
        KeyCode::Left | KeyCode::Char('h') => browser.collapse_or_parent(),
        _ => {}
    }
    Ok(Action::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_call_graph;
    use crate::parser::schema::{EdgeStats, Location, ProfileData, RawStats};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn graph() -> CallGraph {
        let mut data = ProfileData::new();
        data.insert(Location::new("a.py", 1, "main"), RawStats::leaf(1, 0.1, 1.0));
        data.insert(
            Location::new("a.py", 2, "work"),
            RawStats::leaf(1, 0.9, 0.9)
                .with_caller(Location::new("a.py", 1, "main"), EdgeStats::from_count(1)),
        );
        build_call_graph(&data).unwrap()
    }

    #[test]
    fn test_quit_keys() {
        let graph = graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));
        for code in [KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Esc] {
            assert_eq!(handle_key(&mut browser, press(code), 10).unwrap(), Action::Quit);
        }
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut browser, ctrl_c, 10).unwrap(), Action::Quit);
    }

    #[test]
    fn test_navigation_keys() {
        let graph = graph();
        let mut browser = Browser::new(TreeNode::roots(&graph));

        handle_key(&mut browser, press(KeyCode::Enter), 10).unwrap();
        assert_eq!(browser.rows().len(), 2);

        handle_key(&mut browser, press(KeyCode::Char('j')), 10).unwrap();
        assert_eq!(browser.selected(), 1);

        handle_key(&mut browser, press(KeyCode::Left), 10).unwrap();
        assert_eq!(browser.selected(), 0);

        handle_key(&mut browser, press(KeyCode::Char('h')), 10).unwrap();
        assert_eq!(browser.rows().len(), 1);

        assert_eq!(
            handle_key(&mut browser, press(KeyCode::Char('x')), 10).unwrap(),
            Action::Continue
        );
    }
}
