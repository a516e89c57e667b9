use std::{fmt, sync::Arc};

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadId(Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadId({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub name: String,
    pub percent: f64,
}

/// In-flight uploads of this client. Entries leave on success and on failure.
#[derive(Clone, Default)]
pub struct UploadTracker {
    uploads: Arc<DashMap<UploadId, UploadProgress>>,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, name: &str) -> UploadId {
        let id = UploadId::new();
        self.uploads.insert(
            id,
            UploadProgress {
                name: name.to_owned(),
                percent: 0.0,
            },
        );
        id
    }

    pub fn report(&self, id: UploadId, percent: f64) {
        if let Some(mut entry) = self.uploads.get_mut(&id) {
            entry.percent = percent.clamp(0.0, 100.0);
        }
    }

    pub fn finish(&self, id: UploadId) {
        self.uploads.remove(&id);
    }

    pub fn get(&self, id: UploadId) -> Option<UploadProgress> {
        self.uploads.get(&id).map(|entry| entry.clone())
    }

    /// Current uploads, oldest first.
    pub fn snapshot(&self) -> Vec<(UploadId, UploadProgress)> {
        let mut uploads: Vec<_> = self
            .uploads
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        uploads.sort_by_key(|(id, _)| *id);
        uploads
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_named_files_are_tracked_apart() {
        let tracker = UploadTracker::new();
        let first = tracker.start("photo.jpg");
        let second = tracker.start("photo.jpg");

        tracker.report(first, 40.0);
        tracker.report(second, 250.0);
        assert_eq!(tracker.get(first).unwrap().percent, 40.0);
        assert_eq!(tracker.get(second).unwrap().percent, 100.0);

        tracker.finish(first);
        let left = tracker.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].0, second);

        tracker.finish(second);
        assert!(tracker.is_empty());
    }
}
