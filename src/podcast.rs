// src/podcast.rs
use serde::{Deserialize, Serialize};
use std::fmt;

// === PODCAST STRUCTURES ===
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodcastID(String);

impl fmt::Display for PodcastID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PodcastID {
    pub fn new(s: &str) -> Self {
        PodcastID(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PodcastID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A feed container on the remote service. Never mutated after it is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podcast {
    id: PodcastID,
    #[serde(default)]
    title: String,
}

impl Podcast {
    pub fn new(id: PodcastID, title: String) -> Self {
        Self { id, title }
    }

    pub fn id(&self) -> &PodcastID {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

// === JOB STRUCTURES ===

/// Lifecycle of a conversion job. Decoded once at the serde boundary so nothing
/// downstream compares raw status strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Created,
    Success,
    Error,
    Unknown(String),
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "CREATED" => JobStatus::Created,
            "SUCCESS" => JobStatus::Success,
            "ERROR" => JobStatus::Error,
            _ => JobStatus::Unknown(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Created => f.write_str("CREATED"),
            JobStatus::Success => f.write_str("SUCCESS"),
            JobStatus::Error => f.write_str("ERROR"),
            JobStatus::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl JobStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Created)
    }
}

/// One video-to-feed conversion request as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(default, rename = "error", skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl Item {
    pub fn new(
        status: JobStatus,
        title: Option<String>,
        created: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        Self { status, title, created, error_message }
    }

    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    // The server omits or blanks optional fields interchangeably.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    pub fn created(&self) -> Option<&str> {
        self.created.as_deref().filter(|c| !c.is_empty())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref().filter(|e| !e.is_empty())
    }
}

/// Quota snapshot, both values in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub usage: u64,
    pub limit: u64,
}

impl Usage {
    pub fn ratio(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        (self.usage as f64 / self.limit as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddUrlRequest<'a> {
    pub podcast_id: &'a str,
    pub url: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_decodes_status_into_variant() {
        let items: Vec<Item> = serde_json::from_str(
            r#"[
                {"status":"CREATED"},
                {"status":"SUCCESS","title":"Episode","created":"2024-01-01T00:00:00Z"},
                {"status":"ERROR","error":"video unavailable"},
                {"status":"QUEUED","title":""}
            ]"#,
        )
        .unwrap();

        assert_eq!(items[0].status(), &JobStatus::Created);
        assert_eq!(items[1].status(), &JobStatus::Success);
        assert_eq!(items[1].title(), Some("Episode"));
        assert_eq!(items[2].error_message(), Some("video unavailable"));
        assert_eq!(items[3].status(), &JobStatus::Unknown("QUEUED".to_string()));
        assert_eq!(items[3].title(), None);
    }

    #[test]
    fn test_usage_ratio_with_zero_limit() {
        assert_eq!(Usage { usage: 10, limit: 0 }.ratio(), 0.0);
        assert_eq!(Usage { usage: 50, limit: 100 }.ratio(), 0.5);
        assert_eq!(Usage { usage: 500, limit: 100 }.ratio(), 1.0);
    }

    #[test]
    fn test_add_url_request_shape() {
        let body = AddUrlRequest { podcast_id: "p1", url: "https://youtu.be/x" };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"podcast_id":"p1","url":"https://youtu.be/x"}"#
        );
    }
}
