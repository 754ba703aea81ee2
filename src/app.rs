use crate::commands::app_commands::Command;
use crate::commands::poll::PollState;
use crate::credentials::CredentialStore;
use crate::errors::{ApiError, ValidationError};
use crate::event::{AppEvent, Generation};
use crate::podcast::{Item, Podcast, Usage};
use crate::widgets::text_input::TextInput;
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, error, info};
use std::sync::Arc;
use url::Url;

/// The screen currently shown. Exactly one is active.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum View {
    AwaitingCredential,
    MainMenu,
    SelectingPodcast,
    EnteringUrl,
    ViewingItems,
    FatalError,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MenuEntry {
    AddUrl,
    SetApiKey,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 2] = [MenuEntry::AddUrl, MenuEntry::SetApiKey];

    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::AddUrl => "Add YouTube URL",
            MenuEntry::SetApiKey => "Set API Key",
        }
    }
}

/// Session-wide data that outlives any single screen.
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub has_credential: bool,
    pub usage: Option<Usage>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl Session {
    fn clear_banners(&mut self) {
        self.message = None;
        self.error = None;
    }
}

pub struct App {
    pub should_quit: bool,
    pub session: Session,
    pub menu_index: usize,
    pub podcasts: Vec<Podcast>,
    pub podcasts_loading: bool,
    pub podcast_index: usize,
    pub selected_podcast: Option<Podcast>,
    pub items: Vec<Item>,
    pub items_loaded_at: Option<DateTime<Utc>>,
    pub item_index: usize,
    pub submitting: bool,
    pub credential_input: TextInput,
    pub url_input: TextInput,
    pub spinner_frame: usize,
    pub fatal_error: Option<String>,
    pub terminal_size: (u16, u16),
    view: View,
    poll: PollState,
    generation: Generation,
    credentials: Arc<dyn CredentialStore>,
}

impl App {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> App {
        App {
            should_quit: false,
            session: Session::default(),
            menu_index: 0,
            podcasts: Vec::new(),
            podcasts_loading: false,
            podcast_index: 0,
            selected_podcast: None,
            items: Vec::new(),
            items_loaded_at: None,
            item_index: 0,
            submitting: false,
            credential_input: TextInput::masked(256),
            url_input: TextInput::new(500),
            spinner_frame: 0,
            fatal_error: None,
            terminal_size: (0, 0),
            view: View::AwaitingCredential,
            poll: PollState::default(),
            generation: 0,
            credentials,
        }
    }

    /// Commands to issue before the first event.
    pub fn init(&self) -> Vec<Command> {
        vec![Command::CheckCredential]
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_enabled()
    }

    pub fn poll_timer_pending(&self) -> bool {
        self.poll.timer_pending()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// 0 on a normal quit, 1 after a fatal error.
    pub fn exit_code(&self) -> u8 {
        if self.fatal_error.is_some() { 1 } else { 0 }
    }

    // ==================================== Transitions ============================================

    /// Every view change goes through here so in-flight results for the old
    /// screen become stale.
    fn enter(&mut self, view: View) {
        if self.view != view {
            info!("View: {:?} -> {:?}", self.view, view);
        }
        self.view = view;
        self.generation += 1;
        self.submitting = false;
    }

    fn is_current(&self, generation: Generation, view: View) -> bool {
        generation == self.generation && self.view == view
    }

    fn quit(&mut self) {
        self.poll.stop();
        self.should_quit = true;
    }

    /// Escalates an unrecoverable startup condition.
    pub fn fatal(&mut self, message: String) {
        error!("Fatal: {}", message);
        self.poll.stop();
        self.selected_podcast = None;
        self.fatal_error = Some(message);
        self.enter(View::FatalError);
    }

    fn enter_main_menu(&mut self) {
        self.enter(View::MainMenu);
    }

    fn enter_credential_prompt(&mut self) {
        self.session.clear_banners();
        self.credential_input.reset();
        self.enter(View::AwaitingCredential);
    }

    fn enter_podcast_selection(&mut self) -> Vec<Command> {
        self.session.clear_banners();
        self.podcasts.clear();
        self.podcast_index = 0;
        self.podcasts_loading = true;
        self.enter(View::SelectingPodcast);
        vec![Command::LoadPodcasts { generation: self.generation }]
    }

    fn enter_url_input(&mut self) {
        self.session.error = None;
        self.url_input.reset();
        self.enter(View::EnteringUrl);
    }

    // ===================================== Dispatch ==============================================

    pub fn update(&mut self, event: AppEvent) -> Vec<Command> {
        match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Resize(width, height) => {
                self.terminal_size = (width, height);
                Vec::new()
            }
            AppEvent::Frame => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Vec::new()
            }
            AppEvent::CredentialChecked(result) => self.on_credential_checked(result),
            AppEvent::UsageLoaded(result) => self.on_usage_loaded(result),
            AppEvent::PodcastsLoaded { generation, result } => {
                self.on_podcasts_loaded(generation, result)
            }
            AppEvent::UrlAdded { generation, result } => self.on_url_added(generation, result),
            AppEvent::ItemsLoaded { generation, result } => {
                self.on_items_loaded(generation, result)
            }
            AppEvent::PollTick { generation } => self.on_poll_tick(generation),
        }
    }

    // ===================================== Results ===============================================

    fn on_credential_checked(&mut self, result: Result<bool, String>) -> Vec<Command> {
        match result {
            Ok(true) => {
                self.session.has_credential = true;
                if self.view == View::AwaitingCredential {
                    self.enter_main_menu();
                    return vec![Command::LoadUsage];
                }
                Vec::new()
            }
            Ok(false) => {
                // A key saved while the check was in flight wins over the late answer.
                if self.session.has_credential {
                    debug!("Ignoring late credential check, a key was set meanwhile");
                }
                Vec::new()
            }
            Err(message) => {
                self.fatal(message);
                Vec::new()
            }
        }
    }

    fn on_usage_loaded(&mut self, result: Result<Usage, ApiError>) -> Vec<Command> {
        match result {
            Ok(usage) => self.session.usage = Some(usage),
            Err(e) => self.session.error = Some(e.to_string()),
        }
        Vec::new()
    }

    fn on_podcasts_loaded(
        &mut self,
        generation: Generation,
        result: Result<Vec<Podcast>, ApiError>,
    ) -> Vec<Command> {
        if !self.is_current(generation, View::SelectingPodcast) {
            debug!("Dropping stale podcast list (generation {})", generation);
            return Vec::new();
        }
        self.podcasts_loading = false;
        match result {
            Ok(podcasts) => {
                info!("Loaded {} podcasts", podcasts.len());
                self.podcasts = podcasts;
                self.podcast_index = 0;
                self.session.error = None;
            }
            Err(e) => {
                self.enter_main_menu();
                self.session.error = Some(e.to_string());
            }
        }
        Vec::new()
    }

    fn on_url_added(&mut self, generation: Generation, result: Result<Item, ApiError>) -> Vec<Command> {
        if !self.is_current(generation, View::EnteringUrl) {
            debug!("Dropping stale add-url result (generation {})", generation);
            return Vec::new();
        }
        self.submitting = false;
        match result {
            Ok(item) => {
                let Some(podcast) = self.selected_podcast.clone() else {
                    return Vec::new();
                };
                info!("URL accepted for '{}', job status {}", podcast.title(), item.status());
                self.session.error = None;
                self.url_input.reset();
                self.items = vec![item];
                self.items_loaded_at = None;
                self.item_index = 0;
                self.enter(View::ViewingItems);
                self.poll.start();
                vec![Command::LoadItems { generation: self.generation, podcast_id: podcast.id().clone() }]
            }
            Err(e) => {
                self.session.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn on_items_loaded(
        &mut self,
        generation: Generation,
        result: Result<Vec<Item>, ApiError>,
    ) -> Vec<Command> {
        if !self.is_current(generation, View::ViewingItems) {
            debug!("Dropping stale item list (generation {})", generation);
            return Vec::new();
        }
        match result {
            Ok(items) => {
                // Wholesale replacement; no merge with the previous fetch.
                self.items = items;
                self.items_loaded_at = Some(Utc::now());
                self.item_index = self.item_index.min(self.items.len().saturating_sub(1));
                self.session.error = None;
                self.poll.on_items(&self.items, generation)
            }
            Err(e) => {
                self.session.error = Some(e.to_string());
                self.poll.stop();
                Vec::new()
            }
        }
    }

    fn on_poll_tick(&mut self, generation: Generation) -> Vec<Command> {
        if generation != self.generation {
            debug!("Dropping stale poll tick (generation {})", generation);
            return Vec::new();
        }
        if !self.poll.on_tick() || self.view != View::ViewingItems {
            return Vec::new();
        }
        match &self.selected_podcast {
            Some(podcast) => {
                vec![Command::LoadItems { generation, podcast_id: podcast.id().clone() }]
            }
            None => Vec::new(),
        }
    }

    // ====================================== Keys =================================================

    pub fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        match self.view {
            View::AwaitingCredential => self.on_credential_key(key),
            View::MainMenu => self.on_menu_key(key),
            View::SelectingPodcast => self.on_podcast_key(key),
            View::EnteringUrl => self.on_url_key(key),
            View::ViewingItems => self.on_items_key(key),
            View::FatalError => {
                self.quit();
                Vec::new()
            }
        }
    }

    fn on_credential_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                if self.session.has_credential {
                    self.enter_main_menu();
                } else {
                    self.quit();
                }
                Vec::new()
            }
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                match self.credentials.clear() {
                    Ok(()) => {
                        self.session.has_credential = false;
                        self.session.message = Some("API key cleared successfully!".to_string());
                        self.session.error = None;
                    }
                    Err(e) => self.session.error = Some(e.to_string()),
                }
                Vec::new()
            }
            (KeyCode::Enter, _) => {
                let secret: String = self.credential_input.value().trim().to_string();
                if secret.is_empty() {
                    return Vec::new();
                }
                match self.credentials.set(&secret) {
                    Ok(()) => {
                        self.session.has_credential = true;
                        self.session.message = Some("API key saved successfully!".to_string());
                        self.session.error = None;
                        self.credential_input.reset();
                        self.enter_main_menu();
                        vec![Command::LoadUsage]
                    }
                    Err(e) => {
                        self.session.error = Some(e.to_string());
                        Vec::new()
                    }
                }
            }
            _ => {
                self.credential_input.handle_key(key);
                Vec::new()
            }
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let entries = MenuEntry::ALL.len();
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.quit(),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
                self.menu_index = (self.menu_index + entries - 1) % entries;
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
                self.menu_index = (self.menu_index + 1) % entries;
            }
            (KeyCode::Char(c @ '1'..='9'), _) => {
                let index = (c as usize) - ('1' as usize);
                if index < entries {
                    self.menu_index = index;
                }
            }
            (KeyCode::Enter, _) => match MenuEntry::ALL[self.menu_index % entries] {
                MenuEntry::SetApiKey => self.enter_credential_prompt(),
                MenuEntry::AddUrl => return self.enter_podcast_selection(),
            },
            _ => {}
        }
        Vec::new()
    }

    fn on_podcast_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.quit(),
            (KeyCode::Esc, _) => self.enter_main_menu(),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
                self.podcast_index = self.podcast_index.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
                if self.podcast_index + 1 < self.podcasts.len() {
                    self.podcast_index += 1;
                }
            }
            (KeyCode::Enter, _) => {
                if let Some(podcast) = self.podcasts.get(self.podcast_index) {
                    info!("Selected podcast '{}'", podcast.title());
                    self.selected_podcast = Some(podcast.clone());
                    self.enter_url_input();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_url_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.quit(),
            (KeyCode::Esc, _) => {
                self.session.error = None;
                self.enter(View::SelectingPodcast);
            }
            (KeyCode::Enter, _) => return self.submit_url(),
            _ if self.submitting => {}
            _ => self.url_input.handle_key(key),
        }
        Vec::new()
    }

    fn submit_url(&mut self) -> Vec<Command> {
        if self.submitting {
            return Vec::new();
        }
        let Some(podcast) = &self.selected_podcast else {
            return Vec::new();
        };
        let raw: &str = self.url_input.value().trim();
        if raw.is_empty() {
            return Vec::new();
        }
        match validate_video_url(raw) {
            Ok(url) => {
                info!("Submitting {} to '{}'", url, podcast.title());
                let command = Command::AddUrl {
                    generation: self.generation,
                    podcast_id: podcast.id().clone(),
                    url,
                };
                self.session.error = None;
                self.submitting = true;
                vec![command]
            }
            Err(e) => {
                self.session.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn on_items_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.quit(),
            (KeyCode::Char('a'), _) => {
                self.poll.stop();
                self.enter_url_input();
            }
            (KeyCode::Char('m'), _) => {
                self.poll.stop();
                self.selected_podcast = None;
                self.items.clear();
                self.items_loaded_at = None;
                self.session.clear_banners();
                self.enter_main_menu();
                return vec![Command::LoadUsage];
            }
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
                self.item_index = self.item_index.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
                if self.item_index + 1 < self.items.len() {
                    self.item_index += 1;
                }
            }
            _ => {}
        }
        Vec::new()
    }
}

/// Only absolute http(s) URLs are submitted.
pub fn validate_video_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed: &str = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput("URL"));
    }
    let parsed: Url =
        Url::parse(trimmed).map_err(|e| ValidationError::InvalidUrl(format!("{} ({})", trimmed, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "{} (only http and https are supported)",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::poll::POLL_INTERVAL;
    use crate::credentials::MemoryCredentialStore;
    use crate::podcast::{JobStatus, PodcastID};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.update(key(KeyCode::Char(c))).is_empty());
        }
    }

    fn podcast() -> Podcast {
        Podcast::new(PodcastID::new("p1"), "Daily".to_string())
    }

    fn item(status: JobStatus) -> Item {
        Item::new(status, None, None, None)
    }

    fn logged_in() -> (App, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::with_secret("key"));
        let mut app = App::new(store.clone());
        app.update(AppEvent::CredentialChecked(Ok(true)));
        (app, store)
    }

    /// Logged in, podcast chosen, URL accepted: ViewingItems with polling on.
    fn viewing_items() -> App {
        let (mut app, _) = logged_in();
        let cmds = app.update(key(KeyCode::Enter));
        let Command::LoadPodcasts { generation } = cmds[0] else { panic!("{:?}", cmds) };
        app.update(AppEvent::PodcastsLoaded { generation, result: Ok(vec![podcast()]) });
        app.update(key(KeyCode::Enter));
        type_text(&mut app, "https://youtu.be/abc");
        let cmds = app.update(key(KeyCode::Enter));
        let Command::AddUrl { generation, .. } = cmds[0].clone() else { panic!("{:?}", cmds) };
        let cmds = app.update(AppEvent::UrlAdded { generation, result: Ok(item(JobStatus::Created)) });
        assert_eq!(app.view(), View::ViewingItems);
        assert!(matches!(cmds[0], Command::LoadItems { .. }));
        app
    }

    #[test]
    fn test_startup_checks_credential() {
        let app = App::new(Arc::new(MemoryCredentialStore::new()));
        assert_eq!(app.view(), View::AwaitingCredential);
        assert_eq!(app.init(), vec![Command::CheckCredential]);
    }

    #[test]
    fn test_existing_credential_goes_to_menu_and_loads_usage() {
        let mut app = App::new(Arc::new(MemoryCredentialStore::with_secret("k")));
        let cmds = app.update(AppEvent::CredentialChecked(Ok(true)));
        assert_eq!(app.view(), View::MainMenu);
        assert_eq!(cmds, vec![Command::LoadUsage]);
    }

    #[test]
    fn test_missing_credential_stays_on_prompt() {
        let mut app = App::new(Arc::new(MemoryCredentialStore::new()));
        assert!(app.update(AppEvent::CredentialChecked(Ok(false))).is_empty());
        assert_eq!(app.view(), View::AwaitingCredential);
        assert!(!app.session.has_credential);
    }

    #[test]
    fn test_credential_store_failure_is_fatal() {
        let mut app = App::new(Arc::new(MemoryCredentialStore::new()));
        app.update(AppEvent::CredentialChecked(Err("corrupt".into())));
        assert_eq!(app.view(), View::FatalError);
        assert!(!app.should_quit);

        app.update(key(KeyCode::Char('x')));
        assert!(app.should_quit);
        assert_eq!(app.exit_code(), 1);
    }

    #[test]
    fn test_submitting_credential_stores_it_and_refreshes_usage() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut app = App::new(store.clone());
        app.update(AppEvent::CredentialChecked(Ok(false)));

        type_text(&mut app, "key1");
        let cmds = app.update(key(KeyCode::Enter));

        assert_eq!(app.view(), View::MainMenu);
        assert_eq!(cmds, vec![Command::LoadUsage]);
        assert_eq!(store.get().unwrap(), Some("key1".to_string()));
        assert!(app.session.has_credential);
        assert_eq!(app.session.message.as_deref(), Some("API key saved successfully!"));
        assert!(app.credential_input.value().is_empty());
    }

    #[test]
    fn test_late_missing_credential_check_keeps_saved_key() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut app = App::new(store.clone());
        type_text(&mut app, "key1");
        app.update(key(KeyCode::Enter));
        assert_eq!(app.view(), View::MainMenu);

        // The startup lookup answers only now, from before the key existed.
        assert!(app.update(AppEvent::CredentialChecked(Ok(false))).is_empty());
        assert!(app.session.has_credential);
        assert_eq!(app.view(), View::MainMenu);

        app.update(key(KeyCode::Char('2')));
        app.update(key(KeyCode::Enter));
        assert_eq!(app.view(), View::AwaitingCredential);
        app.update(key(KeyCode::Esc));
        assert_eq!(app.view(), View::MainMenu);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_empty_credential_is_ignored() {
        let mut app = App::new(Arc::new(MemoryCredentialStore::new()));
        type_text(&mut app, "   ");
        assert!(app.update(key(KeyCode::Enter)).is_empty());
        assert_eq!(app.view(), View::AwaitingCredential);
    }

    #[test]
    fn test_clear_credential_then_cancel_quits() {
        let (mut app, store) = logged_in();
        app.update(key(KeyCode::Down));
        app.update(key(KeyCode::Enter));
        assert_eq!(app.view(), View::AwaitingCredential);

        app.update(ctrl('d'));
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(app.session.message.as_deref(), Some("API key cleared successfully!"));
        assert_eq!(app.view(), View::AwaitingCredential);

        app.update(key(KeyCode::Esc));
        assert!(app.should_quit);
        assert_eq!(app.exit_code(), 0);
    }

    #[test]
    fn test_cancel_with_credential_returns_to_menu() {
        let (mut app, _) = logged_in();
        app.update(key(KeyCode::Char('2')));
        app.update(key(KeyCode::Enter));
        assert_eq!(app.view(), View::AwaitingCredential);
        app.update(key(KeyCode::Esc));
        assert_eq!(app.view(), View::MainMenu);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_add_url_loads_podcasts() {
        let (mut app, _) = logged_in();
        let cmds = app.update(key(KeyCode::Enter));
        assert_eq!(app.view(), View::SelectingPodcast);
        assert_eq!(cmds, vec![Command::LoadPodcasts { generation: app.generation() }]);
        assert!(app.podcasts_loading);
    }

    #[test]
    fn test_podcast_load_failure_returns_to_menu_with_error() {
        let (mut app, _) = logged_in();
        let generation = app.generation() + 1;
        app.update(key(KeyCode::Enter));
        app.update(AppEvent::PodcastsLoaded {
            generation,
            result: Err(ApiError::Transport("refused".into())),
        });
        assert_eq!(app.view(), View::MainMenu);
        assert!(app.session.error.as_deref().unwrap_or_default().contains("refused"));
    }

    #[test]
    fn test_stale_podcast_list_is_dropped() {
        let (mut app, _) = logged_in();
        app.update(key(KeyCode::Enter));
        let stale = app.generation();
        app.update(key(KeyCode::Esc));
        assert_eq!(app.view(), View::MainMenu);

        app.update(AppEvent::PodcastsLoaded { generation: stale, result: Ok(vec![podcast()]) });
        assert_eq!(app.view(), View::MainMenu);
        assert!(app.podcasts.is_empty());
    }

    #[test]
    fn test_empty_url_submit_changes_nothing() {
        let (mut app, _) = logged_in();
        app.update(key(KeyCode::Enter));
        let generation = app.generation();
        app.update(AppEvent::PodcastsLoaded { generation, result: Ok(vec![podcast()]) });
        app.update(key(KeyCode::Enter));
        assert_eq!(app.view(), View::EnteringUrl);
        let before = app.generation();

        assert!(app.update(key(KeyCode::Enter)).is_empty());
        assert_eq!(app.view(), View::EnteringUrl);
        assert_eq!(app.generation(), before);
        assert!(!app.submitting);
        assert!(app.session.error.is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected_before_dispatch() {
        let (mut app, _) = logged_in();
        app.update(key(KeyCode::Enter));
        let generation = app.generation();
        app.update(AppEvent::PodcastsLoaded { generation, result: Ok(vec![podcast()]) });
        app.update(key(KeyCode::Enter));
        type_text(&mut app, "ftp://example.com/v");
        assert!(app.update(key(KeyCode::Enter)).is_empty());
        assert!(app.session.error.as_deref().unwrap_or_default().starts_with("Invalid URL"));
    }

    #[test]
    fn test_typing_q_in_url_input_does_not_quit() {
        let (mut app, _) = logged_in();
        app.update(key(KeyCode::Enter));
        let generation = app.generation();
        app.update(AppEvent::PodcastsLoaded { generation, result: Ok(vec![podcast()]) });
        app.update(key(KeyCode::Enter));
        type_text(&mut app, "q");
        assert!(!app.should_quit);
        assert_eq!(app.url_input.value(), "q");
    }

    #[test]
    fn test_add_url_failure_stays_on_input() {
        let (mut app, _) = logged_in();
        app.update(key(KeyCode::Enter));
        let generation = app.generation();
        app.update(AppEvent::PodcastsLoaded { generation, result: Ok(vec![podcast()]) });
        app.update(key(KeyCode::Enter));
        type_text(&mut app, "https://youtu.be/abc");
        let cmds = app.update(key(KeyCode::Enter));
        assert!(app.submitting);
        // A second Enter while the first submission is in flight is ignored.
        assert!(app.update(key(KeyCode::Enter)).is_empty());

        let Command::AddUrl { generation, ref podcast_id, ref url } = cmds[0] else {
            panic!("{:?}", cmds)
        };
        assert_eq!(podcast_id, &PodcastID::new("p1"));
        assert_eq!(url, "https://youtu.be/abc");

        app.update(AppEvent::UrlAdded {
            generation,
            result: Err(ApiError::Http { status: "400 Bad Request".into(), body: "bad".into() }),
        });
        assert_eq!(app.view(), View::EnteringUrl);
        assert!(!app.submitting);
        assert!(!app.is_polling());
        assert_eq!(app.url_input.value(), "https://youtu.be/abc");
    }

    #[test]
    fn test_url_added_starts_polling_and_fetches_items() {
        let app = viewing_items();
        assert!(app.is_polling());
        assert_eq!(app.items.len(), 1);
        assert!(app.selected_podcast.is_some());
    }

    #[test]
    fn test_created_items_schedule_one_poll() {
        let mut app = viewing_items();
        let generation = app.generation();
        let cmds = app.update(AppEvent::ItemsLoaded {
            generation,
            result: Ok(vec![item(JobStatus::Created), item(JobStatus::Success)]),
        });
        assert_eq!(cmds, vec![Command::SchedulePoll { generation, delay: POLL_INTERVAL }]);
        assert!(app.poll_timer_pending());

        let cmds = app.update(AppEvent::PollTick { generation });
        assert_eq!(
            cmds,
            vec![Command::LoadItems { generation, podcast_id: PodcastID::new("p1") }]
        );
        assert!(!app.poll_timer_pending());
    }

    #[test]
    fn test_resolved_items_stop_polling_and_refresh_usage() {
        let mut app = viewing_items();
        let generation = app.generation();
        let cmds = app.update(AppEvent::ItemsLoaded {
            generation,
            result: Ok(vec![item(JobStatus::Success), item(JobStatus::Success)]),
        });
        assert_eq!(cmds, vec![Command::LoadUsage]);
        assert!(!app.is_polling());
        assert!(app.update(AppEvent::PollTick { generation }).is_empty());
    }

    #[test]
    fn test_items_error_stops_polling() {
        let mut app = viewing_items();
        let generation = app.generation();
        let cmds = app.update(AppEvent::ItemsLoaded {
            generation,
            result: Err(ApiError::Transport("timeout".into())),
        });
        assert!(cmds.is_empty());
        assert!(!app.is_polling());
        assert!(app.session.error.is_some());
    }

    #[test]
    fn test_add_another_stops_polling_and_drops_old_results() {
        let mut app = viewing_items();
        let old = app.generation();
        app.update(AppEvent::ItemsLoaded { generation: old, result: Ok(vec![item(JobStatus::Created)]) });

        app.update(key(KeyCode::Char('a')));
        assert_eq!(app.view(), View::EnteringUrl);
        assert!(!app.is_polling());
        assert!(app.url_input.value().is_empty());

        assert!(app.update(AppEvent::PollTick { generation: old }).is_empty());
        assert!(app.update(AppEvent::ItemsLoaded { generation: old, result: Ok(vec![]) }).is_empty());
        assert_eq!(app.items.len(), 1);
    }

    #[test]
    fn test_main_menu_clears_selection_and_refreshes_usage() {
        let mut app = viewing_items();
        let cmds = app.update(key(KeyCode::Char('m')));
        assert_eq!(app.view(), View::MainMenu);
        assert_eq!(cmds, vec![Command::LoadUsage]);
        assert!(!app.is_polling());
        assert!(app.selected_podcast.is_none());
    }

    #[test]
    fn test_quit_from_items_stops_polling() {
        let mut app = viewing_items();
        app.update(key(KeyCode::Char('q')));
        assert!(app.should_quit);
        assert!(!app.is_polling());
    }

    #[test]
    fn test_usage_is_applied_in_any_view() {
        let mut app = viewing_items();
        app.update(AppEvent::UsageLoaded(Ok(Usage { usage: 5, limit: 10 })));
        assert_eq!(app.session.usage, Some(Usage { usage: 5, limit: 10 }));
    }

    #[test]
    fn test_key_release_is_ignored() {
        let (mut app, _) = logged_in();
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        app.update(AppEvent::Key(release));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_validate_video_url() {
        assert_eq!(
            validate_video_url(" https://www.youtube.com/watch?v=x "),
            Ok("https://www.youtube.com/watch?v=x".to_string())
        );
        assert_eq!(validate_video_url(""), Err(ValidationError::EmptyInput("URL")));
        assert!(matches!(validate_video_url("youtube"), Err(ValidationError::InvalidUrl(_))));
        assert!(matches!(validate_video_url("mailto:a@b.c"), Err(ValidationError::InvalidUrl(_))));
    }
}
