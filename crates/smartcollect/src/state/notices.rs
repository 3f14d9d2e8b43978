//! Console notices: short titled messages about what just happened.

use chrono::Local;
use serde::Serialize;

/// Maximum notices kept in memory.
pub const MAX_NOTICES: usize = 200;
/// Trim to this many when the cap is exceeded.
pub const NOTICE_TRIM_TO: usize = 120;

/// How a notice should be presented.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

#[derive(Serialize, Clone, Debug)]
pub struct Notice {
    /// Monotonic sequence number; clients poll with `since`.
    pub seq: u64,
    pub time: String,
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

/// Bounded notice feed.
#[derive(Debug, Default)]
pub struct NoticeFeed {
    entries: Vec<Notice>,
    next_seq: u64,
}

impl NoticeFeed {
    pub fn push(
        &mut self,
        variant: NoticeVariant,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> u64 {
        self.next_seq += 1;
        self.entries.push(Notice {
            seq: self.next_seq,
            time: Local::now().format("%H:%M:%S").to_string(),
            title: title.into(),
            description: description.into(),
            variant,
        });
        if self.entries.len() > MAX_NOTICES {
            let trim_to = self.entries.len() - NOTICE_TRIM_TO;
            self.entries.drain(..trim_to);
        }
        self.next_seq
    }

    /// Notices newer than `seq`, oldest first.
    pub fn since(&self, seq: u64) -> Vec<Notice> {
        self.entries
            .iter()
            .filter(|n| n.seq > seq)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_returns_only_newer_notices() {
        let mut feed = NoticeFeed::default();
        let first = feed.push(NoticeVariant::Default, "Case Created", "a");
        feed.push(NoticeVariant::Destructive, "AI Analysis Failed", "b");
        let newer = feed.since(first);
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].title, "AI Analysis Failed");
        assert_eq!(feed.since(0).len(), 2);
    }

    #[test]
    fn feed_is_trimmed_past_the_cap() {
        let mut feed = NoticeFeed::default();
        for i in 0..=MAX_NOTICES {
            feed.push(NoticeVariant::Default, format!("n{i}"), "");
        }
        assert_eq!(feed.len(), NOTICE_TRIM_TO);
        assert_eq!(
            feed.latest().map(|n| n.title.as_str()),
            Some(format!("n{MAX_NOTICES}").as_str())
        );
    }
}
