// src/event.rs
use crate::errors::ApiError;
use crate::podcast::{Item, Podcast, Usage};
use crossterm::event::KeyEvent;

/// Tags a request with the screen entry that issued it.
pub type Generation = u64;

/// Everything the event loop consumes, processed strictly in arrival order.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Spinner animation frame.
    Frame,

    /// Startup credential lookup. `Err` carries the store's diagnostic.
    CredentialChecked(Result<bool, String>),
    UsageLoaded(Result<Usage, ApiError>),
    PodcastsLoaded {
        generation: Generation,
        result: Result<Vec<Podcast>, ApiError>,
    },
    UrlAdded {
        generation: Generation,
        result: Result<Item, ApiError>,
    },
    ItemsLoaded {
        generation: Generation,
        result: Result<Vec<Item>, ApiError>,
    },
    /// The one-shot poll timer fired.
    PollTick { generation: Generation },
}
