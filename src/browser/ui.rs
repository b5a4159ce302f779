use super::app::{Browser, Row};
use crate::tree::{Stripe, TreeCursor};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Static facts shown in the header
pub struct Header {
    pub source: String,
    pub functions: usize,
    pub roots: usize,
}

pub fn render(frame: &mut Frame, browser: &mut Browser<'_>, header: &Header) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, browser, header, outer[0]);
    render_tree(frame, browser, outer[1]);
    render_footer(frame, outer[2]);
}

/// Rows that fit in the tree pane, used for paging
pub fn page_size(area: Rect) -> usize {
    // header, footer and the list border
    usize::from(area.height.saturating_sub(4)).max(1)
}

fn render_header(frame: &mut Frame, browser: &Browser<'_>, header: &Header, area: Rect) {
    let position = format!("{}/{}", browser.selected() + 1, browser.rows().len());
    let bar = Paragraph::new(Line::from(vec![
        Span::styled(
            " steelix ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "{} | {} functions | {} roots | row {}",
            header.source, header.functions, header.roots, position
        )),
    ]))
    .style(Style::default().fg(Color::White).bg(Color::Black));
    frame.render_widget(bar, area);
}

fn render_tree(frame: &mut Frame, browser: &mut Browser<'_>, area: Rect) {
    let items: Vec<ListItem> = browser.rows().iter().map(row_item).collect();

    let title = format!(
        " {:>10} {:>10} {:>8}  function ",
        "cumtime", "tottime", "ncalls"
    );
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Gray)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, area, browser.list_state_mut());
}

fn row_item(row: &Row<'_>) -> ListItem<'static> {
    let fields = row.node.display_fields();
    let marker = if row.cycle {
        "↻ "
    } else if !row.has_children {
        "  "
    } else if row.expanded {
        "▾ "
    } else {
        "▸ "
    };

    let mut spans = vec![
        Span::styled(
            format!(
                "{:>10.4} {:>10.4} {:>8}  ",
                fields.cumulative_time, fields.self_time, fields.call_count
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!("{}{}", "  ".repeat(row.node.depth()), marker)),
        Span::raw(fields.label()),
    ];
    if row.cycle {
        spans.push(Span::styled(" [cycle]", Style::default().fg(Color::Red)));
    }

    let background = match row.node.stripe() {
        Stripe::Even => Color::Black,
        Stripe::Odd => Color::Rgb(20, 20, 20),
    };
    ListItem::new(Line::from(spans)).style(Style::default().bg(background))
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Cyan);
    let bar = Paragraph::new(Line::from(vec![
        Span::styled(" ↑↓/jk ", key),
        Span::raw("move  "),
        Span::styled("Enter/→/e ", key),
        Span::raw("expand  "),
        Span::styled("←/h ", key),
        Span::raw("collapse/parent  "),
        Span::styled("PgUp/PgDn ", key),
        Span::raw("page  "),
        Span::styled("q ", key),
        Span::raw("quit"),
    ]))
    .style(Style::default().fg(Color::Gray).bg(Color::DarkGray));
    frame.render_widget(bar, area);
}
