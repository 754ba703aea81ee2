// src/commands/dispatcher.rs
use crate::api_client::PodcastApi;
use crate::commands::app_commands::Command;
use crate::credentials::CredentialStore;
use crate::event::AppEvent;
use log::{debug, error, warn};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Runs commands off the event loop and feeds each result back as one event.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn PodcastApi>,
    credentials: Arc<dyn CredentialStore>,
    event_tx: UnboundedSender<AppEvent>,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn PodcastApi>,
        credentials: Arc<dyn CredentialStore>,
        event_tx: UnboundedSender<AppEvent>,
    ) -> Self {
        Self { api, credentials, event_tx }
    }

    pub fn dispatch(&self, command: Command) -> JoinHandle<()> {
        debug!("Dispatcher: {:?}", command);
        let api: Arc<dyn PodcastApi> = self.api.clone();
        let credentials: Arc<dyn CredentialStore> = self.credentials.clone();
        let event_tx: UnboundedSender<AppEvent> = self.event_tx.clone();
        let name: &'static str = command.name();

        tokio::spawn(async move {
            let event: AppEvent = execute(api, credentials, command).await;
            if event_tx.send(event).is_err() {
                // The loop is gone; this happens after quit while work was in flight.
                debug!("Dispatcher: dropped {} result, event loop closed", name);
            }
        })
    }

    pub fn dispatch_all(&self, commands: Vec<Command>) {
        for command in commands {
            self.dispatch(command);
        }
    }
}

/// Executes one command to completion.
pub async fn execute(
    api: Arc<dyn PodcastApi>,
    credentials: Arc<dyn CredentialStore>,
    command: Command,
) -> AppEvent {
    match command {
        Command::CheckCredential => {
            let result = tokio::task::spawn_blocking(move || credentials.get()).await;
            let checked: Result<bool, String> = match result {
                Ok(Ok(secret)) => Ok(secret.is_some()),
                Ok(Err(e)) => {
                    error!("Credential check failed: {}", e);
                    Err(e.to_string())
                }
                Err(join_err) => {
                    error!("Credential check task failed: {}", join_err);
                    Err(join_err.to_string())
                }
            };
            AppEvent::CredentialChecked(checked)
        }
        Command::LoadUsage => {
            let result = api.get_usage().await;
            if let Err(e) = &result {
                warn!("Loading usage failed: {}", e);
            }
            AppEvent::UsageLoaded(result)
        }
        Command::LoadPodcasts { generation } => {
            let result = api.list_podcasts().await;
            if let Err(e) = &result {
                warn!("Loading podcasts failed: {}", e);
            }
            AppEvent::PodcastsLoaded { generation, result }
        }
        Command::AddUrl { generation, podcast_id, url } => {
            let result = api.add_url(&podcast_id, &url).await;
            if let Err(e) = &result {
                warn!("Adding {} to podcast {} failed: {}", url, podcast_id, e);
            }
            AppEvent::UrlAdded { generation, result }
        }
        Command::LoadItems { generation, podcast_id } => {
            let result = api.get_items(&podcast_id).await;
            if let Err(e) = &result {
                warn!("Loading items for podcast {} failed: {}", podcast_id, e);
            }
            AppEvent::ItemsLoaded { generation, result }
        }
        Command::SchedulePoll { generation, delay } => {
            tokio::time::sleep(delay).await;
            AppEvent::PollTick { generation }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::FakeApi;
    use crate::credentials::MemoryCredentialStore;
    use crate::errors::ApiError;
    use crate::podcast::{Item, JobStatus, Podcast, PodcastID, Usage};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn setup(api: FakeApi, secret: Option<&str>) -> (Dispatcher, mpsc::UnboundedReceiver<AppEvent>, Arc<FakeApi>) {
        let api = Arc::new(api);
        let store: Arc<dyn CredentialStore> = match secret {
            Some(s) => Arc::new(MemoryCredentialStore::with_secret(s)),
            None => Arc::new(MemoryCredentialStore::new()),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        (Dispatcher::new(api.clone(), store, tx), rx, api)
    }

    #[tokio::test]
    async fn test_check_credential_reports_presence() {
        let (dispatcher, mut rx, _) = setup(FakeApi::new(), Some("abc"));
        dispatcher.dispatch(Command::CheckCredential).await.unwrap();
        assert!(matches!(rx.recv().await, Some(AppEvent::CredentialChecked(Ok(true)))));

        let (dispatcher, mut rx, _) = setup(FakeApi::new(), None);
        dispatcher.dispatch(Command::CheckCredential).await.unwrap();
        assert!(matches!(rx.recv().await, Some(AppEvent::CredentialChecked(Ok(false)))));
    }

    #[tokio::test]
    async fn test_each_command_yields_one_tagged_event() {
        let api = FakeApi::new()
            .with_podcasts(Ok(vec![Podcast::new(PodcastID::new("p1"), "Pod".into())]))
            .with_items(Ok(vec![Item::new(JobStatus::Created, None, None, None)]))
            .with_usage(Ok(Usage { usage: 1, limit: 2 }));
        let (dispatcher, mut rx, api) = setup(api, Some("k"));

        dispatcher.dispatch(Command::LoadPodcasts { generation: 3 }).await.unwrap();
        match rx.recv().await {
            Some(AppEvent::PodcastsLoaded { generation: 3, result: Ok(podcasts) }) => {
                assert_eq!(podcasts.len(), 1)
            }
            other => panic!("unexpected event {:?}", other),
        }

        dispatcher
            .dispatch(Command::AddUrl {
                generation: 4,
                podcast_id: PodcastID::new("p1"),
                url: "https://youtu.be/abc".into(),
            })
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::UrlAdded { generation: 4, result: Ok(_) })
        ));

        dispatcher
            .dispatch(Command::LoadItems { generation: 5, podcast_id: PodcastID::new("p1") })
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::ItemsLoaded { generation: 5, result: Ok(_) })
        ));

        dispatcher.dispatch(Command::LoadUsage).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::UsageLoaded(Ok(Usage { usage: 1, limit: 2 })))
        ));

        assert_eq!(
            api.calls(),
            vec!["list_podcasts", "add_url p1 https://youtu.be/abc", "get_items p1", "get_usage"]
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failure_is_delivered_as_result() {
        let api = FakeApi::new().with_podcasts(Err(ApiError::Transport("down".into())));
        let (dispatcher, mut rx, _) = setup(api, Some("k"));

        dispatcher.dispatch(Command::LoadPodcasts { generation: 1 }).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::PodcastsLoaded { result: Err(ApiError::Transport(_)), .. })
        ));
    }

    #[tokio::test]
    async fn test_schedule_poll_fires_after_delay() {
        let (dispatcher, mut rx, api) = setup(FakeApi::new(), Some("k"));
        let handle = dispatcher
            .dispatch(Command::SchedulePoll { generation: 9, delay: Duration::from_millis(20) });
        assert!(rx.try_recv().is_err());

        handle.await.unwrap();
        assert!(matches!(rx.recv().await, Some(AppEvent::PollTick { generation: 9 })));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_closed_loop_does_not_panic() {
        let (dispatcher, rx, _) = setup(FakeApi::new(), Some("k"));
        drop(rx);
        dispatcher.dispatch(Command::LoadUsage).await.unwrap();
    }
}
