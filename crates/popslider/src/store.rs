//! Persistent show counter.
//!
//! The counter lives in a small YAML map of string keys to string values,
//! one file per site origin, mirroring what a browser keeps in local storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR: &str = "popslider";
const ORIGINS_DIR: &str = "origins";

pub const LAST_VISIT_KEY: &str = "lastVisit";
pub const POPUP_COUNT_KEY: &str = "popupCount";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterState {
    pub last_visit_date: String,
    pub shown_count: u32,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not a valid key-value map: {0}")]
    Format(#[from] serde_yaml::Error),

    #[error("stored {key} value {value:?} is invalid")]
    Corrupt { key: &'static str, value: String },
}

pub trait CounterStore {
    /// Load the stored counter. A missing record is `Ok(None)`, not an error.
    fn read(&self) -> Result<Option<CounterState>, PersistenceError>;

    fn write(&self, state: &CounterState) -> Result<(), PersistenceError>;
}

/// File-backed store keyed by site origin.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the user's local data directory for the origin of `site_url`.
    pub fn for_site(site_url: &str) -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| {
            tracing::warn!("no local data directory; keeping popup counter in the temp dir");
            std::env::temp_dir()
        });
        Self::new(
            base.join(APP_DIR)
                .join(ORIGINS_DIR)
                .join(format!("{}.yaml", origin_file_stem(site_url))),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forget the stored counter. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool, PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_yaml::from_str(&contents)?)
    }
}

impl CounterStore for FileCounterStore {
    fn read(&self) -> Result<Option<CounterState>, PersistenceError> {
        let map = self.read_map()?;
        let Some(last_visit) = map.get(LAST_VISIT_KEY) else {
            return Ok(None);
        };

        let raw_count = map.get(POPUP_COUNT_KEY).cloned().unwrap_or_default();
        let shown_count = raw_count
            .trim()
            .parse::<u32>()
            .map_err(|_| PersistenceError::Corrupt {
                key: POPUP_COUNT_KEY,
                value: raw_count.clone(),
            })?;

        Ok(Some(CounterState {
            last_visit_date: last_visit.clone(),
            shown_count,
        }))
    }

    fn write(&self, state: &CounterState) -> Result<(), PersistenceError> {
        // Keep unrelated keys intact; an unreadable file is simply replaced.
        let mut map = self.read_map().unwrap_or_default();
        map.insert(LAST_VISIT_KEY.to_string(), state.last_visit_date.clone());
        map.insert(POPUP_COUNT_KEY.to_string(), state.shown_count.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yaml::to_string(&map)?)?;
        Ok(())
    }
}

/// Turn a site URL into a file-name-safe origin, e.g.
/// `https://contoso.sharepoint.com/sites/hr` -> `https_3a_2f_2fcontoso_2esharepoint_2ecom`.
///
/// ASCII letters and digits pass through; every other byte, `_` included,
/// becomes `_` plus two hex digits, so distinct origins never share a file.
pub fn origin_file_stem(site_url: &str) -> String {
    let origin = match url::Url::parse(site_url.trim()) {
        Ok(url) => url.origin().ascii_serialization(),
        Err(_) => site_url.trim().to_string(),
    };
    if origin.is_empty() {
        return "_".to_string();
    }

    let mut stem = String::with_capacity(origin.len() * 2);
    for byte in origin.bytes() {
        if byte.is_ascii_alphanumeric() {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02x}"));
        }
    }
    stem
}


#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileCounterStore {
        FileCounterStore::new(dir.path().join("origins").join("site.yaml"))
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).read().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let state = CounterState {
            last_visit_date: "2024-05-01".to_string(),
            shown_count: 2,
        };
        store.write(&state).unwrap();
        assert_eq!(store.read().unwrap(), Some(state));
    }

    #[test]
    fn test_values_persisted_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .write(&CounterState {
                last_visit_date: "2024-05-01".to_string(),
                shown_count: 3,
            })
            .unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        let map: BTreeMap<String, String> = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(map.get("lastVisit").map(String::as_str), Some("2024-05-01"));
        assert_eq!(map.get("popupCount").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_overwrites_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for count in 1..=3 {
            store
                .write(&CounterState {
                    last_visit_date: "2024-05-01".to_string(),
                    shown_count: count,
                })
                .unwrap();
        }
        assert_eq!(store.read().unwrap().unwrap().shown_count, 3);
    }

    #[test]
    fn test_unparsable_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "lastVisit: '2024-05-01'\npopupCount: abc\n").unwrap();
        assert!(matches!(
            store.read(),
            Err(PersistenceError::Corrupt { key: "popupCount", .. })
        ));
    }

    #[test]
    fn test_garbage_file_is_format_error_and_write_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "- not\n- a\n- map\n").unwrap();
        assert!(matches!(store.read(), Err(PersistenceError::Format(_))));

        let state = CounterState {
            last_visit_date: "2024-05-02".to_string(),
            shown_count: 1,
        };
        store.write(&state).unwrap();
        assert_eq!(store.read().unwrap(), Some(state));
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.clear().unwrap());
        store
            .write(&CounterState {
                last_visit_date: "2024-05-01".to_string(),
                shown_count: 1,
            })
            .unwrap();
        assert!(store.clear().unwrap());
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_origin_file_stem() {
        assert_eq!(
            origin_file_stem("https://contoso.sharepoint.com/sites/hr"),
            "https_3a_2f_2fcontoso_2esharepoint_2ecom"
        );
        assert_eq!(
            origin_file_stem("http://localhost:8080/"),
            "http_3a_2f_2flocalhost_3a8080"
        );
        assert_eq!(
            origin_file_stem("https://Contoso.SharePoint.com/sites/a"),
            origin_file_stem("https://contoso.sharepoint.com/sites/b")
        );
        assert_eq!(origin_file_stem(""), "_");
    }

    #[test]
    fn test_distinct_origins_get_distinct_files() {
        let pairs = [
            ("https://a-b.example.com/sites/x", "https://a.b.example.com/sites/x"),
            ("http://localhost:8080", "http://localhost-8080"),
            ("https://a_b.example.com", "https://a-b.example.com"),
            ("https://example.com", "http://example.com"),
        ];
        for (a, b) in pairs {
            assert_ne!(origin_file_stem(a), origin_file_stem(b), "{a} vs {b}");
        }
    }

    #[test]
    fn test_origin_stem_is_file_name_safe() {
        let stem = origin_file_stem("https://xn--bcher-kva.example:8443/path?q=1");
        assert!(stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
