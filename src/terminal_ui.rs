// src/terminal_ui.rs
use crate::api_client::PodcastApi;
use crate::app::App;
use crate::commands::dispatcher::Dispatcher;
use crate::credentials::CredentialStore;
use crate::event::AppEvent;
use crate::presentation::{self, Screen};
use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, info, warn};
use ratatui::{Terminal, backend::Backend, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const INPUT_POLL: Duration = Duration::from_millis(100);
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Takes over the terminal, runs the event loop until the app quits, and
/// hands the final app state back so the caller can pick the exit code.
pub async fn start_ui(
    mut app: App,
    api: Arc<dyn PodcastApi>,
    credentials: Arc<dyn CredentialStore>,
) -> Result<App> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let dispatcher = Dispatcher::new(api, credentials, event_tx.clone());

    let stop = Arc::new(AtomicBool::new(false));
    let input_thread = spawn_input_reader(event_tx.clone(), stop.clone());
    let frame_task = tokio::spawn(frame_ticker(event_tx));

    let res = run_app_loop(&mut terminal, &mut app, &dispatcher, event_rx).await;

    stop.store(true, Ordering::Relaxed);
    frame_task.abort();
    if input_thread.join().is_err() {
        warn!("Input reader thread panicked");
    }

    // Restore the terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(app)
}

pub async fn run_app_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    mut events: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let size = terminal.size()?;
    app.terminal_size = (size.width, size.height);
    dispatcher.dispatch_all(app.init());
    draw(terminal, app)?;

    while !app.should_quit {
        let Some(event) = events.recv().await else {
            info!("Event channel closed, leaving");
            break;
        };
        let commands = app.update(event);
        dispatcher.dispatch_all(commands);
        draw(terminal, app)?;
    }

    Ok(())
}

fn draw<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> Result<()> {
    let screen: Screen = presentation::render(app);
    terminal.draw(|f| crate::ui::ui(f, &screen))?;
    Ok(())
}

/// Blocking crossterm reads live on their own thread; the stop flag is
/// checked between polls.
fn spawn_input_reader(event_tx: UnboundedSender<AppEvent>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    warn!("Polling terminal input failed: {}", e);
                    break;
                }
            }
            let app_event = match event::read() {
                Ok(Event::Key(key)) => AppEvent::Key(key),
                Ok(Event::Resize(width, height)) => AppEvent::Resize(width, height),
                Ok(_) => continue,
                Err(e) => {
                    warn!("Reading terminal input failed: {}", e);
                    break;
                }
            };
            if event_tx.send(app_event).is_err() {
                break;
            }
        }
        debug!("Input reader stopped");
    })
}

async fn frame_ticker(event_tx: UnboundedSender<AppEvent>) {
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    loop {
        interval.tick().await;
        if event_tx.send(AppEvent::Frame).is_err() {
            break;
        }
    }
}
