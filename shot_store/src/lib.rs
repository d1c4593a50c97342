use std::{
    fs, io,
    path::{Path, PathBuf},
};

use shot_schema::{Session, SessionDraft};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("failed to read sessions: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write sessions: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse sessions json")]
    Parse(#[from] serde_json::Error),
}

/// Where sessions live. Implementations own retries and caching.
pub trait SessionStore {
    /// Sessions of `user_id`, newest date first.
    fn load(&self, user_id: &str) -> Result<Vec<Session>, StoreError>;

    /// Creates a session when `id` is `None`, otherwise replaces that
    /// session's draft fields. Returns the session id.
    fn save(&mut self, user_id: &str, id: Option<&str>, draft: &SessionDraft) -> Result<String, StoreError>;
}

pub fn load_sessions_from_path(path: impl AsRef<Path>) -> Result<Vec<Session>, StoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn load_sessions_from_str(json: &str) -> Result<Vec<Session>, StoreError> {
    Ok(serde_json::from_str(json)?)
}

/// A JSON array of session documents in one file. A missing file is an
/// empty store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<Session>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StoreError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_all(&self, sessions: &[Session]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(sessions)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .read_all()?
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect();
        // YYYY-MM-DD sorts as text
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        debug!(user_id, count = sessions.len(), "loaded sessions");
        Ok(sessions)
    }

    fn save(&mut self, user_id: &str, id: Option<&str>, draft: &SessionDraft) -> Result<String, StoreError> {
        if user_id.trim().is_empty() {
            return Err(StoreError::NotSignedIn);
        }
        let mut sessions = self.read_all()?;

        let id = match id {
            Some(id) => {
                let existing = sessions
                    .iter_mut()
                    .find(|s| s.id == id && s.user_id == user_id)
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                apply_draft(existing, draft);
                id.to_string()
            }
            None => {
                let id = next_id(&sessions);
                let mut session = Session {
                    id: id.clone(),
                    user_id: user_id.to_string(),
                    ..Session::default()
                };
                apply_draft(&mut session, draft);
                sessions.push(session);
                id
            }
        };

        self.write_all(&sessions)?;
        info!(id = %id, path = %self.path.display(), "session written");
        Ok(id)
    }
}

/// Rounds become the only source; the legacy map is dropped on first save.
fn apply_draft(session: &mut Session, draft: &SessionDraft) {
    session.date = draft.date.clone();
    session.training_type = draft.training_type.clone();
    session.zone_group = Some(draft.zone_group.id().to_string());
    session.notes = draft.notes.clone();
    session.rounds = draft.rounds.clone();
    session.zones = None;
}

fn next_id(sessions: &[Session]) -> String {
    let max = sessions
        .iter()
        .filter_map(|s| s.id.strip_prefix('s')?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("s{}", max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shot_schema::{Round, ZoneGroup};
    use std::env;

    fn tmp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("shot_store_{name}_{}.json", std::process::id()))
    }

    fn draft(date: &str) -> SessionDraft {
        SessionDraft {
            date: date.to_string(),
            training_type: "spot".to_string(),
            zone_group: ZoneGroup::Midrange,
            notes: Some("felt good".to_string()),
            rounds: vec![Round::new(0, "Free Throw", 10, 8)],
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let store = JsonFileStore::new(tmp_path("missing"));
        let _ = fs::remove_file(store.path());
        assert!(store.load("u").unwrap().is_empty());
    }

    #[test]
    fn create_then_update() {
        let path = tmp_path("create_update");
        let _ = fs::remove_file(&path);
        let mut store = JsonFileStore::new(&path);

        let a = store.save("u", None, &draft("2025-08-01")).unwrap();
        let b = store.save("u", None, &draft("2025-08-03")).unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("s1", "s2"));

        let mut changed = draft("2025-07-30");
        changed.rounds[0].made = 9;
        assert_eq!(store.save("u", Some("s2"), &changed).unwrap(), "s2");

        let sessions = store.load("u").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "s1");
        assert_eq!(sessions[1].rounds[0].made, 9);
        assert_eq!(sessions[1].zone_group.as_deref(), Some("MID"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_requires_identity_and_known_id() {
        let path = tmp_path("identity");
        let _ = fs::remove_file(&path);
        let mut store = JsonFileStore::new(&path);

        assert!(matches!(store.save(" ", None, &draft("2025-08-01")), Err(StoreError::NotSignedIn)));
        assert!(!path.exists());
        assert!(matches!(
            store.save("u", Some("s40"), &draft("2025-08-01")),
            Err(StoreError::NotFound(id)) if id == "s40"
        ));
    }

    #[test]
    fn load_filters_by_user_and_drops_legacy_map_on_save() {
        let path = tmp_path("legacy");
        fs::write(
            &path,
            r#"[
  { "id": "s3", "userId": "u", "date": "2024-01-01", "trainingType": "spot",
    "zones": { "top_key": { "attempts": 10, "made": 6 } } },
  { "id": "s4", "userId": "other", "date": "2024-02-01", "trainingType": "spot", "rounds": [] }
]"#,
        )
        .unwrap();
        let mut store = JsonFileStore::new(&path);

        let sessions = store.load("u").unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].zones.is_some());

        store.save("u", Some("s3"), &draft("2024-01-01")).unwrap();
        let sessions = store.load("u").unwrap();
        assert!(sessions[0].zones.is_none());
        assert_eq!(sessions[0].rounds.len(), 1);
        assert_eq!(store.save("u", None, &draft("2024-01-02")).unwrap(), "s5");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_from_str_reports_bad_json() {
        assert!(matches!(load_sessions_from_str("{"), Err(StoreError::Parse(_))));
        assert!(matches!(
            load_sessions_from_path(tmp_path("never_written")),
            Err(StoreError::Read { .. })
        ));
    }
}
