use crate::event::Generation;
use crate::podcast::PodcastID;
use std::time::Duration;

/// Deferred I/O requested by a transition. Each command produces exactly one
/// `AppEvent` once the dispatcher has run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CheckCredential,
    LoadUsage,
    LoadPodcasts { generation: Generation },
    AddUrl { generation: Generation, podcast_id: PodcastID, url: String },
    LoadItems { generation: Generation, podcast_id: PodcastID },
    SchedulePoll { generation: Generation, delay: Duration },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CheckCredential => "check-credential",
            Command::LoadUsage => "load-usage",
            Command::LoadPodcasts { .. } => "load-podcasts",
            Command::AddUrl { .. } => "add-url",
            Command::LoadItems { .. } => "load-items",
            Command::SchedulePoll { .. } => "schedule-poll",
        }
    }
}
