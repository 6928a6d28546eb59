//! Highlight/Ticker Cache.
//!
//! Announcement records may open with a `[HIGHLIGHT_JOB:<id>]` directive. The
//! directive puts the job into a TTL-bound highlight map; whatever text remains
//! goes to the ticker. The map's own expiry is authoritative: deactivating the
//! source record upstream is only a courtesy.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::debug;
use wallboard_core::{JobId, TickerLevel};
use wallboard_store::AnnouncementRecord;

static DIRECTIVE_RE: OnceLock<Regex> = OnceLock::new();

fn directive_re() -> &'static Regex {
    DIRECTIVE_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*\[HIGHLIGHT_JOB:\s*([^\]\s]+)\s*\]\s*")
            .expect("valid directive regex")
    })
}

/// Result of splitting an announcement message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnnouncement {
    pub highlight: Option<JobId>,
    /// Remaining ticker text, `None` when nothing but whitespace is left.
    pub text: Option<String>,
}

/// Split a message into its leading highlight directive and ticker text.
/// A directive anywhere but the start of the message is plain text.
pub fn parse_directive(message: &str) -> ParsedAnnouncement {
    let (highlight, rest) = match directive_re().captures(message) {
        Some(caps) => {
            let id = caps.get(1).map(|m| JobId::from(m.as_str()));
            let end = caps.get(0).map_or(0, |m| m.end());
            (id, &message[end..])
        }
        None => (None, message),
    };
    let trimmed = rest.trim();
    ParsedAnnouncement {
        highlight,
        text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerMessage {
    pub id: String,
    pub text: String,
    pub level: TickerLevel,
}

/// Side effects the caller must carry out after [`HighlightCache::ingest`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Records whose directive had already expired; deactivate upstream.
    pub stale: Vec<String>,
    pub highlights_added: usize,
    pub highlights_removed: usize,
}

#[derive(Debug, Default, Clone)]
pub struct HighlightCache {
    entries: HashMap<JobId, DateTime<Utc>>,
    /// Announcement record → the job it highlighted.
    sources: HashMap<String, JobId>,
    ticker: Vec<TickerMessage>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a fresh announcement batch. The ticker is replaced wholesale;
    /// highlights are upserted and only ever leave via expiry or deactivation.
    pub fn ingest(
        &mut self,
        records: &[AnnouncementRecord],
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        let mut ordered: Vec<&AnnouncementRecord> = records.iter().collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut ticker = Vec::new();
        for record in ordered {
            if !record.active {
                if let Some(job_id) = self.sources.remove(&record.id) {
                    // Another live record may still highlight the same job.
                    let still_sourced = self.sources.values().any(|j| *j == job_id);
                    if !still_sourced && self.entries.remove(&job_id).is_some() {
                        outcome.highlights_removed += 1;
                    }
                }
                continue;
            }

            let parsed = parse_directive(&record.message);
            if let Some(job_id) = parsed.highlight {
                let expiry = record.created_at + ttl;
                if expiry <= now {
                    outcome.stale.push(record.id.clone());
                    continue;
                }
                let slot = self.entries.entry(job_id.clone()).or_insert(expiry);
                if expiry > *slot {
                    *slot = expiry;
                }
                if self.sources.insert(record.id.clone(), job_id).is_none() {
                    outcome.highlights_added += 1;
                }
            }
            if let Some(text) = parsed.text {
                ticker.push(TickerMessage {
                    id: record.id.clone(),
                    text,
                    level: record.level,
                });
            }
        }
        self.ticker = ticker;

        debug!(
            highlights = self.entries.len(),
            ticker = self.ticker.len(),
            stale = outcome.stale.len(),
            "announcements ingested"
        );
        outcome
    }

    /// Drop every highlight whose expiry is at or before `now`.
    /// Returns how many were removed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expiry| *expiry > now);
        let entries = &self.entries;
        self.sources.retain(|_, job_id| entries.contains_key(job_id));
        before - self.entries.len()
    }

    pub fn active_ids(&self) -> BTreeSet<JobId> {
        self.entries.keys().cloned().collect()
    }

    pub fn is_highlighted(&self, job_id: &JobId) -> bool {
        self.entries.contains_key(job_id)
    }

    pub fn expiry(&self, job_id: &JobId) -> Option<DateTime<Utc>> {
        self.entries.get(job_id).copied()
    }

    pub fn ticker(&self) -> &[TickerMessage] {
        &self.ticker
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.sources.clear();
        self.ticker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn record(id: &str, message: &str, created_at: DateTime<Utc>) -> AnnouncementRecord {
        AnnouncementRecord {
            id: id.to_string(),
            message: message.to_string(),
            level: TickerLevel::Info,
            created_at,
            active: true,
        }
    }

    #[test]
    fn directive_with_text() {
        let p = parse_directive("[HIGHLIGHT_JOB:abc-123] Gate changed");
        assert_eq!(p.highlight, Some(JobId::from("abc-123")));
        assert_eq!(p.text.as_deref(), Some("Gate changed"));
    }

    #[test]
    fn no_directive_is_plain_text() {
        let p = parse_directive("  Doors open at 19:00 ");
        assert_eq!(p.highlight, None);
        assert_eq!(p.text.as_deref(), Some("Doors open at 19:00"));
    }

    #[test]
    fn directive_only_has_no_ticker_text() {
        let p = parse_directive("[highlight_job:abc-123]   ");
        assert_eq!(p.highlight, Some(JobId::from("abc-123")));
        assert_eq!(p.text, None);
    }

    #[test]
    fn directive_must_lead() {
        let p = parse_directive("Note [HIGHLIGHT_JOB:abc-123]");
        assert_eq!(p.highlight, None);
        assert_eq!(p.text.as_deref(), Some("Note [HIGHLIGHT_JOB:abc-123]"));
    }

    #[test]
    fn ingest_highlights_and_replaces_ticker() {
        let mut cache = HighlightCache::new();
        let ttl = Duration::seconds(300);
        let out = cache.ingest(
            &[
                record("a1", "[HIGHLIGHT_JOB:job-1] Truck late", now()),
                record("a2", "Lunch at 14:00", now()),
            ],
            ttl,
            now(),
        );
        assert!(out.stale.is_empty());
        assert_eq!(out.highlights_added, 1);
        assert!(cache.is_highlighted(&JobId::from("job-1")));
        assert_eq!(cache.expiry(&JobId::from("job-1")), Some(now() + ttl));
        assert_eq!(cache.ticker().len(), 2);

        cache.ingest(&[record("a3", "Only this", now())], ttl, now());
        assert_eq!(cache.ticker().len(), 1);
        assert_eq!(cache.ticker()[0].text, "Only this");
        // Highlights survive a batch that no longer mentions them.
        assert!(cache.is_highlighted(&JobId::from("job-1")));
    }

    #[test]
    fn expired_directive_is_stale() {
        let mut cache = HighlightCache::new();
        let created = now() - Duration::seconds(600);
        let out = cache.ingest(
            &[record("old", "[HIGHLIGHT_JOB:job-9] Old news", created)],
            Duration::seconds(300),
            now(),
        );
        assert_eq!(out.stale, vec!["old".to_string()]);
        assert!(cache.active_ids().is_empty());
        assert!(cache.ticker().is_empty());
    }

    #[test]
    fn inactive_record_removes_its_highlight() {
        let mut cache = HighlightCache::new();
        let ttl = Duration::seconds(300);
        let mut r = record("a1", "[HIGHLIGHT_JOB:job-1]", now());
        cache.ingest(std::slice::from_ref(&r), ttl, now());
        assert!(cache.is_highlighted(&JobId::from("job-1")));

        r.active = false;
        let out = cache.ingest(&[r], ttl, now());
        assert_eq!(out.highlights_removed, 1);
        assert!(!cache.is_highlighted(&JobId::from("job-1")));
    }

    #[test]
    fn deactivating_one_source_keeps_a_shared_highlight() {
        let mut cache = HighlightCache::new();
        let ttl = Duration::seconds(300);
        let a = record("a", "[HIGHLIGHT_JOB:job-1] Doors moved", now());
        let mut b = record("b", "[HIGHLIGHT_JOB:job-1]", now() + Duration::seconds(10));
        cache.ingest(&[a.clone(), b.clone()], ttl, now());
        assert!(cache.is_highlighted(&JobId::from("job-1")));

        b.active = false;
        let out = cache.ingest(&[a, b], ttl, now());
        assert_eq!(out.highlights_removed, 0);
        assert!(cache.is_highlighted(&JobId::from("job-1")));
    }

    #[test]
    fn sweep_removes_exactly_the_expired() {
        let mut cache = HighlightCache::new();
        let ttl = Duration::seconds(60);
        cache.ingest(
            &[
                record("a", "[HIGHLIGHT_JOB:early]", now()),
                record("b", "[HIGHLIGHT_JOB:late]", now() + Duration::seconds(30)),
            ],
            ttl,
            now(),
        );

        // `early` expires exactly at now + 60s: removed. `late` survives.
        let removed = cache.sweep(now() + Duration::seconds(60));
        assert_eq!(removed, 1);
        assert!(!cache.is_highlighted(&JobId::from("early")));
        assert!(cache.is_highlighted(&JobId::from("late")));

        assert_eq!(cache.sweep(now() + Duration::seconds(90)), 1);
        assert!(cache.active_ids().is_empty());
    }
}
