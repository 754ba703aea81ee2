// src/presentation.rs
//! Pure rendering of the application state into a `Screen`.
//!
//! Nothing here touches the terminal; `ui` paints a `Screen` with ratatui and
//! `Screen::to_text` flattens it to plain lines for assertions.

use crate::app::{App, MenuEntry, View};
use crate::podcast::{Item, JobStatus, Usage};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::cmp::Ordering;
use unicode_width::UnicodeWidthChar;

const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub const ITEM_HEADERS: [&str; 3] = ["Title", "Status", "Created"];
pub const ITEM_WIDTHS: [u16; 3] = [60, 20, 30];

#[derive(Debug, Clone, PartialEq)]
pub struct UsageLine {
    pub text: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Lines(Vec<String>),
    Menu { entries: Vec<String>, selected: usize },
    Table { headers: Vec<String>, widths: Vec<u16>, rows: Vec<Vec<String>>, selected: usize },
    Input { value: String, placeholder: String, cursor: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub title: String,
    pub message: Option<String>,
    pub body: Body,
    pub detail: Vec<String>,
    pub usage: Option<UsageLine>,
    pub error: Option<String>,
    pub help: String,
}

impl Screen {
    fn new(title: impl Into<String>, body: Body, help: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: None,
            body,
            detail: Vec::new(),
            usage: None,
            error: None,
            help: help.into(),
        }
    }

    /// Plain-text rendering, top to bottom.
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if !self.title.is_empty() {
            lines.push(self.title.clone());
        }
        if let Some(message) = &self.message {
            lines.push(message.clone());
        }
        match &self.body {
            Body::Lines(body) => lines.extend(body.iter().cloned()),
            Body::Menu { entries, selected } => {
                for (i, entry) in entries.iter().enumerate() {
                    let marker = if i == *selected { ">" } else { " " };
                    lines.push(format!("{} {}. {}", marker, i + 1, entry));
                }
            }
            Body::Table { headers, widths, rows, selected } => {
                lines.push(table_line(headers, widths, false));
                for (i, row) in rows.iter().enumerate() {
                    lines.push(table_line(row, widths, i == *selected));
                }
            }
            Body::Input { value, placeholder, .. } => {
                if value.is_empty() {
                    lines.push(format!("> {}", placeholder));
                } else {
                    lines.push(format!("> {}", value));
                }
            }
        }
        lines.extend(self.detail.iter().cloned());
        if let Some(usage) = &self.usage {
            lines.push(usage.text.clone());
        }
        if let Some(error) = &self.error {
            lines.push(error.clone());
        }
        lines.push(self.help.clone());
        lines.join("\n")
    }
}

fn table_line(cells: &[String], widths: &[u16], selected: bool) -> String {
    let marker = if selected { ">" } else { " " };
    let cols: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| pad_to_width(&truncate_to_width(cell, *width as usize), *width as usize))
        .collect();
    format!("{} {}", marker, cols.join(" ").trim_end())
}

// ===================================== render ====================================================

pub fn render(app: &App) -> Screen {
    match app.view() {
        View::FatalError => render_fatal(app),
        View::AwaitingCredential => render_credential(app),
        View::MainMenu => render_menu(app),
        View::SelectingPodcast => render_podcasts(app),
        View::EnteringUrl => render_url(app),
        View::ViewingItems => render_items(app),
    }
}

fn session_error(app: &App) -> Option<String> {
    app.session.error.as_ref().map(|e| format!("Error: {}", e))
}

fn render_fatal(app: &App) -> Screen {
    let mut screen = Screen::new("", Body::Lines(Vec::new()), "Press any key to exit");
    screen.error = Some(format!(
        "Fatal Error: {}",
        app.fatal_error.as_deref().unwrap_or("unknown error")
    ));
    screen
}

fn render_credential(app: &App) -> Screen {
    let input = &app.credential_input;
    let mut screen = Screen::new(
        "Set API Key",
        Body::Input {
            value: input.display_value(),
            placeholder: "Enter your API key".to_string(),
            cursor: input.cursor(),
        },
        "Press Enter to save • Ctrl+d to clear API key • Esc to cancel",
    );
    screen.message = app.session.message.clone();
    screen.error = session_error(app);
    screen
}

fn render_menu(app: &App) -> Screen {
    let entries: Vec<String> = MenuEntry::ALL.iter().map(|e| e.label().to_string()).collect();
    let mut screen = Screen::new(
        "Main Menu",
        Body::Menu { entries, selected: app.menu_index },
        "↑/↓: Navigate • Enter: Select • q: Quit",
    );
    screen.message = app.session.message.clone();
    screen.usage = app.session.usage.as_ref().map(usage_line);
    screen.error = session_error(app);
    screen
}

fn render_podcasts(app: &App) -> Screen {
    let body = if app.podcasts_loading {
        Body::Lines(vec!["Loading podcasts...".to_string()])
    } else if app.podcasts.is_empty() {
        Body::Lines(vec!["No podcasts found.".to_string()])
    } else {
        Body::Table {
            headers: vec!["Title".to_string()],
            widths: vec![60],
            rows: app.podcasts.iter().map(|p| vec![p.title().to_string()]).collect(),
            selected: app.podcast_index,
        }
    };
    let mut screen =
        Screen::new("Select a Podcast", body, "↑/↓: Navigate • Enter: Select • Esc: Back • q: Quit");
    screen.error = session_error(app);
    screen
}

fn render_url(app: &App) -> Screen {
    let title: &str = app.selected_podcast.as_ref().map(|p| p.title()).unwrap_or_default();
    let mut screen = Screen::new(
        format!("Add URL to: {}", title),
        Body::Input {
            value: app.url_input.display_value(),
            placeholder: "Paste YouTube URL here".to_string(),
            cursor: app.url_input.cursor(),
        },
        "Press Enter to add URL • Esc: Back • Ctrl+c: Quit",
    );
    if app.submitting {
        screen.detail.push(format!("{} Submitting...", spinner(app.spinner_frame)));
    }
    screen.error = session_error(app);
    screen
}

fn render_items(app: &App) -> Screen {
    let title: &str = app.selected_podcast.as_ref().map(|p| p.title()).unwrap_or_default();
    let sorted: Vec<&Item> = sort_items(&app.items);
    let rows: Vec<Vec<String>> =
        sorted.iter().map(|item| item_row(item, app.spinner_frame)).collect();
    let selected: usize = app.item_index.min(rows.len().saturating_sub(1));

    let help = if app.is_polling() {
        "Polling for updates... • a: Add another URL • m: Main menu • q: Quit"
    } else {
        "a: Add another URL • m: Main menu • q: Quit"
    };
    let mut screen = Screen::new(
        format!("Items for: {}", title),
        Body::Table {
            headers: ITEM_HEADERS.iter().map(|h| h.to_string()).collect(),
            widths: ITEM_WIDTHS.to_vec(),
            rows,
            selected,
        },
        help,
    );
    if let Some(message) = sorted.get(selected).and_then(|item| item.error_message()) {
        screen.detail.push(format!("Job error: {}", message));
    }
    if let Some(loaded_at) = app.items_loaded_at {
        screen.detail.push(format!("Last refreshed {}", format_relative(loaded_at, Utc::now())));
    }
    screen.error = session_error(app);
    screen
}

fn usage_line(usage: &Usage) -> UsageLine {
    UsageLine {
        text: format!("Usage: {} / {}", format_bytes(usage.usage), format_bytes(usage.limit)),
        ratio: usage.ratio(),
    }
}

// ================================== derived values ===============================================

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

/// Title, status and created cells for one job.
pub fn item_row(item: &Item, spinner_frame: usize) -> Vec<String> {
    vec![display_title(item), display_status(item.status(), spinner_frame), format_created(item.created())]
}

pub fn display_status(status: &JobStatus, spinner_frame: usize) -> String {
    match status {
        JobStatus::Created => format!("{} PROCESSING", spinner(spinner_frame)),
        JobStatus::Error => "❌ ERROR".to_string(),
        JobStatus::Success => "✓ SUCCESS".to_string(),
        JobStatus::Unknown(raw) => raw.clone(),
    }
}

pub fn display_title(item: &Item) -> String {
    match item.title() {
        Some(title) => title.to_string(),
        None if item.status().is_pending() => "Processing...".to_string(),
        None => "(No title)".to_string(),
    }
}

/// 1024-based units, integer bytes below 1 KB.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

enum CreatedLayout {
    Rfc3339,
    NaiveUtc(&'static str),
    WithOffset(&'static str),
}

/// Tried in order; the first that parses wins.
const CREATED_LAYOUTS: [CreatedLayout; 4] = [
    CreatedLayout::Rfc3339,
    CreatedLayout::NaiveUtc("%Y-%m-%d %H:%M:%S%.fZ"),
    CreatedLayout::NaiveUtc("%Y-%m-%d %H:%M:%SZ"),
    CreatedLayout::WithOffset("%Y-%m-%d %H:%M:%S%.f%:z"),
];

pub fn parse_created(created: &str) -> Option<DateTime<Utc>> {
    if created.is_empty() {
        return None;
    }
    CREATED_LAYOUTS.iter().find_map(|layout| match layout {
        CreatedLayout::Rfc3339 => {
            DateTime::parse_from_rfc3339(created).ok().map(|dt| dt.with_timezone(&Utc))
        }
        CreatedLayout::NaiveUtc(pattern) => {
            NaiveDateTime::parse_from_str(created, pattern).ok().map(|naive| naive.and_utc())
        }
        CreatedLayout::WithOffset(pattern) => {
            DateTime::parse_from_str(created, pattern).ok().map(|dt| dt.with_timezone(&Utc))
        }
    })
}

/// Newest first; items without a parseable timestamp go last in received order.
pub fn sort_items(items: &[Item]) -> Vec<&Item> {
    let mut sorted: Vec<(&Item, Option<DateTime<Utc>>)> =
        items.iter().map(|item| (item, item.created().and_then(parse_created))).collect();
    sorted.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted.into_iter().map(|(item, _)| item).collect()
}

pub fn format_created(created: Option<&str>) -> String {
    match created.and_then(parse_created) {
        Some(dt) => format_absolute(dt, &Local),
        None => "-".to_string(),
    }
}

/// `Jan 2, 2006 3:04 PM` in the given zone.
pub fn format_absolute<Tz: TimeZone>(dt: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.with_timezone(tz).format("%b %-d, %Y %-I:%M %p").to_string()
}

pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    match seconds {
        s if s < 10 => "just now".to_string(),
        s if s < 60 => format!("{}s ago", s),
        s if s < 3600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3600),
        s => format!("{}d ago", s / 86_400),
    }
}

/// Cuts to `max_width` terminal columns, ending in `…` when shortened.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn pad_to_width(text: &str, width: usize) -> String {
    let used: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    format!("{}{}", text, " ".repeat(width.saturating_sub(used)))
}
