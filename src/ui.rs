use crate::presentation::{Body, Screen};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};
use unicode_width::UnicodeWidthChar;

const ACCENT: Color = Color::Rgb(0x7D, 0x56, 0xF4);
const MUTED: Color = Color::Rgb(0x62, 0x62, 0x62);
const ERROR: Color = Color::Rgb(0xFF, 0x00, 0x00);
const SUCCESS: Color = Color::Rgb(0x04, 0xB5, 0x75);

pub fn ui(f: &mut Frame, screen: &Screen) {
    let error_height: u16 = screen.error.as_ref().map_or(0, |e| e.lines().count().max(1) as u16);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if screen.title.is_empty() { 0 } else { 2 }), // title + margin
            Constraint::Length(if screen.message.is_some() { 1 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(screen.detail.len() as u16),
            Constraint::Length(if screen.usage.is_some() { 3 } else { 0 }),
            Constraint::Length(error_height),
            Constraint::Length(2), // margin + help
        ])
        .split(f.size());

    let title_style = Style::default().fg(ACCENT).add_modifier(Modifier::BOLD);
    f.render_widget(Paragraph::new(screen.title.as_str()).style(title_style), chunks[0]);

    if let Some(message) = &screen.message {
        let style = Style::default().fg(SUCCESS).add_modifier(Modifier::BOLD);
        f.render_widget(Paragraph::new(message.as_str()).style(style), chunks[1]);
    }

    draw_body(f, &screen.body, chunks[2]);

    let detail: Vec<Line> = screen.detail.iter().map(|l| Line::from(l.as_str())).collect();
    f.render_widget(Paragraph::new(detail).style(Style::default().fg(MUTED)), chunks[3]);

    if let Some(usage) = &screen.usage {
        let usage_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
            .split(chunks[4]);
        f.render_widget(
            Paragraph::new(usage.text.as_str()).style(Style::default().fg(MUTED)),
            usage_chunks[1],
        );
        let gauge_area = Rect { width: usage_chunks[2].width.min(40), ..usage_chunks[2] };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(ACCENT).bg(Color::Black))
            .ratio(usage.ratio.clamp(0.0, 1.0))
            .label(format!("{:.0}%", usage.ratio * 100.0));
        f.render_widget(gauge, gauge_area);
    }

    if let Some(error) = &screen.error {
        let style = Style::default().fg(ERROR).add_modifier(Modifier::BOLD);
        f.render_widget(
            Paragraph::new(error.as_str()).style(style).wrap(Wrap { trim: false }),
            chunks[5],
        );
    }

    let help_area = Rect { y: chunks[6].y + 1, height: 1, ..chunks[6] };
    f.render_widget(Paragraph::new(screen.help.as_str()).style(Style::default().fg(MUTED)), help_area);
}

fn draw_body(f: &mut Frame, body: &Body, area: Rect) {
    match body {
        Body::Lines(lines) => {
            let text: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();
            f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), area);
        }
        Body::Menu { entries, selected } => {
            let items: Vec<ListItem> = entries
                .iter()
                .enumerate()
                .map(|(i, entry)| ListItem::new(format!("{}. {}", i + 1, entry)))
                .collect();
            let list = List::new(items)
                .highlight_style(Style::default().fg(ACCENT))
                .highlight_symbol("> ");
            let mut state = ListState::default();
            state.select(Some(*selected));
            f.render_stateful_widget(list, area, &mut state);
        }
        Body::Table { headers, widths, rows, selected } => {
            let header_style = Style::default().add_modifier(Modifier::BOLD);
            let header = Row::new(headers.iter().map(|h| Cell::from(h.as_str())))
                .style(header_style)
                .bottom_margin(1);
            let table_rows: Vec<Row> = rows
                .iter()
                .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.as_str()))))
                .collect();
            let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w)).collect();
            let table = Table::new(table_rows, constraints)
                .header(header)
                .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(ACCENT)))
                .highlight_style(Style::default().fg(Color::White).bg(ACCENT));
            let mut state = TableState::default();
            if !rows.is_empty() {
                state.select(Some(*selected));
            }
            f.render_stateful_widget(table, area, &mut state);
        }
        Body::Input { value, placeholder, cursor } => {
            let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT));
            let inner: Rect = block.inner(area);
            let input_area = Rect { height: 3.min(area.height), ..area };

            let line: Line = if value.is_empty() {
                Line::from(Span::styled(placeholder.as_str(), Style::default().fg(MUTED)))
            } else {
                Line::from(value.as_str())
            };
            let cursor_width: usize = value.chars().take(*cursor).map(|c| c.width().unwrap_or(0)).sum();
            let scroll: usize = cursor_width.saturating_sub(inner.width.saturating_sub(1) as usize);

            f.render_widget(Paragraph::new(line).block(block).scroll((0, scroll as u16)), input_area);
            f.set_cursor(inner.x + (cursor_width - scroll) as u16, inner.y);
        }
    }
}
