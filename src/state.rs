use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;

/// Comic ids picked by earlier runs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet {
    ids: BTreeSet<u32>,
}

impl SeenSet {
    /// Missing, unreadable or malformed files all yield an empty set.
    pub fn load(path: &Path) -> Self {
        let Ok(data) = std::fs::read_to_string(path) else {
            return SeenSet::default();
        };

        let mut seen = match serde_json::from_str::<SeenSet>(&data) {
            Ok(seen) => seen,
            Err(_) => match parse_plain(&data) {
                Some(ids) => SeenSet { ids },
                None => {
                    tracing::warn!("Ignoring malformed seen file {}", path.display());
                    return SeenSet::default();
                }
            },
        };
        seen.ids.remove(&0);
        seen
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string(self).map_err(std::io::Error::from)?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn mark_seen(&mut self, id: u32) {
        self.ids.insert(id);
    }

    pub fn is_new(&self, id: u32) -> bool {
        !self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<u32> for SeenSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        SeenSet {
            ids: iter.into_iter().collect(),
        }
    }
}

// Older runs wrote one id per line.
fn parse_plain(data: &str) -> Option<BTreeSet<u32>> {
    data.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.parse().ok())
        .collect()
}

#[cfg(test)]
pub(crate) fn temp_path(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("xkcd-rss-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("seen.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;

    #[test]
    fn test_missing_file_is_empty() {
        let path = temp_path("missing");
        assert!(SeenSet::load(&path).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut seen = SeenSet::default();
        seen.mark_seen(42);
        seen.save(&path).unwrap();

        let loaded = SeenSet::load(&path);
        assert_eq!(loaded, seen);
        assert!(!loaded.is_new(42));
        assert!(loaded.is_new(43));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[42]");
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let path = temp_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"seen\": oops").unwrap();
        assert!(SeenSet::load(&path).is_empty());
    }

    #[test]
    fn test_plain_text_ids() {
        let path = temp_path("plain");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "3\n1, 2\n\n0\n").unwrap();
        let seen = SeenSet::load(&path);
        assert_eq!(seen.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_save_failure_is_io_error() {
        let path = temp_path("blocked");
        let parent = path.parent().unwrap();
        std::fs::create_dir_all(parent.parent().unwrap()).unwrap();
        std::fs::write(parent, "not a directory").unwrap();

        let seen: SeenSet = [7].into_iter().collect();
        assert!(matches!(seen.save(&path), Err(FeedError::Io(_))));
    }

    #[test]
    fn test_clear_and_save_persists_empty() {
        let path = temp_path("clear");
        let mut seen: SeenSet = [1, 2, 3].into_iter().collect();
        seen.save(&path).unwrap();
        seen.clear();
        seen.save(&path).unwrap();
        assert!(SeenSet::load(&path).is_empty());
    }
}
