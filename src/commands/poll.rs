// src/commands/poll.rs
use crate::commands::app_commands::Command;
use crate::event::Generation;
use crate::podcast::{Item, JobStatus};
use log::debug;
use std::time::Duration;

/// Fixed delay between two item fetches while a job is unresolved.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// At least one job is still `Created`.
    Continue,
    /// Nothing is pending; `refresh_usage` when every item succeeded.
    Resolved { refresh_usage: bool },
}

/// Looks only at the freshly fetched set.
pub fn decide(items: &[Item]) -> PollDecision {
    if items.iter().any(|item| item.status().is_pending()) {
        return PollDecision::Continue;
    }
    let all_success =
        !items.is_empty() && items.iter().all(|item| item.status() == &JobStatus::Success);
    PollDecision::Resolved { refresh_usage: all_success }
}

/// Polling flag plus the single-timer bookkeeping.
///
/// The timer is one-shot: a new one is requested only from `on_items`, and only
/// when none is pending, so at most one exists at a time.
#[derive(Debug, Default, Clone)]
pub struct PollState {
    enabled: bool,
    timer_pending: bool,
}

impl PollState {
    pub fn start(&mut self) {
        self.enabled = true;
        self.timer_pending = false;
    }

    pub fn stop(&mut self) {
        if self.enabled {
            debug!("Polling stopped");
        }
        self.enabled = false;
        self.timer_pending = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timer_pending(&self) -> bool {
        self.timer_pending
    }

    /// Commands to issue after a successful items fetch.
    pub fn on_items(&mut self, items: &[Item], generation: Generation) -> Vec<Command> {
        if !self.enabled {
            return Vec::new();
        }
        match decide(items) {
            PollDecision::Continue if self.timer_pending => Vec::new(),
            PollDecision::Continue => {
                self.timer_pending = true;
                vec![Command::SchedulePoll { generation, delay: POLL_INTERVAL }]
            }
            PollDecision::Resolved { refresh_usage } => {
                debug!("All jobs resolved (refresh usage: {})", refresh_usage);
                self.enabled = false;
                self.timer_pending = false;
                if refresh_usage { vec![Command::LoadUsage] } else { Vec::new() }
            }
        }
    }

    /// The pending timer fired. Returns whether a fetch should follow.
    pub fn on_tick(&mut self) -> bool {
        self.timer_pending = false;
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(status: JobStatus) -> Item {
        Item::new(status, None, None, None)
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(&[]), PollDecision::Resolved { refresh_usage: false });
        assert_eq!(
            decide(&[item(JobStatus::Success), item(JobStatus::Created)]),
            PollDecision::Continue
        );
        assert_eq!(
            decide(&[item(JobStatus::Success), item(JobStatus::Success)]),
            PollDecision::Resolved { refresh_usage: true }
        );
        assert_eq!(
            decide(&[item(JobStatus::Success), item(JobStatus::Error)]),
            PollDecision::Resolved { refresh_usage: false }
        );
        assert_eq!(
            decide(&[item(JobStatus::Unknown("QUEUED".into()))]),
            PollDecision::Resolved { refresh_usage: false }
        );
    }

    #[test]
    fn test_pending_jobs_schedule_exactly_one_timer() {
        let mut poll = PollState::default();
        poll.start();
        let pending = [item(JobStatus::Created), item(JobStatus::Success)];

        assert_eq!(
            poll.on_items(&pending, 7),
            vec![Command::SchedulePoll { generation: 7, delay: POLL_INTERVAL }]
        );
        assert!(poll.timer_pending());
        // A second result before the timer fires must not add another timer.
        assert!(poll.on_items(&pending, 7).is_empty());

        assert!(poll.on_tick());
        assert!(!poll.timer_pending());
        assert_eq!(poll.on_items(&pending, 7).len(), 1);
    }

    #[test]
    fn test_resolution_disables_once() {
        let mut poll = PollState::default();
        poll.start();
        let done = [item(JobStatus::Success)];

        assert_eq!(poll.on_items(&done, 1), vec![Command::LoadUsage]);
        assert!(!poll.is_enabled());
        // Already disabled: nothing further, no second usage refresh.
        assert!(poll.on_items(&done, 1).is_empty());
        assert!(!poll.on_tick());
    }

    #[test]
    fn test_error_items_resolve_without_usage_refresh() {
        let mut poll = PollState::default();
        poll.start();
        assert!(poll.on_items(&[item(JobStatus::Error)], 1).is_empty());
        assert!(!poll.is_enabled());
    }

    #[test]
    fn test_stop_clears_pending_timer() {
        let mut poll = PollState::default();
        poll.start();
        poll.on_items(&[item(JobStatus::Created)], 1);
        poll.stop();
        assert!(!poll.is_enabled());
        assert!(!poll.timer_pending());
        assert!(!poll.on_tick());
    }
}
