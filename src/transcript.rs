// Transcript persistence: the active conversation lives in `chat.log` inside
// the log directory as a pretty-printed JSON array. Starting a new chat
// renames that file to `<timestamp>_<label>.old.log` next to it.

use crate::error::TranscriptError;
use crate::types::Transcript;
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File name of the active transcript.
pub const ACTIVE_FILE: &str = "chat.log";

/// Suffix shared by every archived transcript.
pub const ARCHIVE_SUFFIX: &str = ".old.log";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Owns the on-disk copy of the active transcript.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TranscriptStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn active_path(&self) -> PathBuf {
        self.dir.join(ACTIVE_FILE)
    }

    /// Whether there is an active transcript on disk.
    pub fn exists(&self) -> bool {
        self.active_path().is_file()
    }

    /// Read the active transcript. A missing file is not an error: it means
    /// no conversation has started yet, so a fresh transcript is returned.
    pub fn load(&self) -> Result<Transcript, TranscriptError> {
        let path = self.active_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no transcript on disk, starting fresh");
                return Ok(Transcript::new());
            }
            Err(e) => return Err(TranscriptError::io(path, e)),
        };

        let transcript: Transcript =
            serde_json::from_slice(&data).map_err(|source| TranscriptError::Corrupt {
                path: path.clone(),
                source,
            })?;
        if !transcript.starts_with_system() {
            return Err(TranscriptError::Invalid {
                path,
                reason: "first message is not a system message".into(),
            });
        }
        debug!(path = %path.display(), messages = transcript.len(), "transcript loaded");
        Ok(transcript)
    }

    /// Replace the active transcript. The data goes to a temp file in the
    /// same directory first and is renamed over `chat.log`, so an interrupted
    /// write leaves the previous file intact.
    pub fn save(&self, transcript: &Transcript) -> Result<(), TranscriptError> {
        fs::create_dir_all(&self.dir).map_err(|e| TranscriptError::io(&self.dir, e))?;
        let path = self.active_path();

        let mut data = serde_json::to_vec_pretty(transcript).map_err(TranscriptError::Encode)?;
        data.push(b'\n');

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| TranscriptError::io(&self.dir, e))?;
        tmp.write_all(&data)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| TranscriptError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| TranscriptError::io(&path, e.error))?;

        debug!(path = %path.display(), messages = transcript.len(), "transcript saved");
        Ok(())
    }

    /// Move the active transcript aside under a name built from the current
    /// local time and `label`. Returns the new path, or `None` when there was
    /// nothing to archive.
    pub fn archive(&self, label: &str) -> Result<Option<PathBuf>, TranscriptError> {
        self.archive_at(label, Local::now().naive_local())
    }

    /// Same as [`archive`](Self::archive) with an explicit timestamp.
    pub fn archive_at(
        &self,
        label: &str,
        at: NaiveDateTime,
    ) -> Result<Option<PathBuf>, TranscriptError> {
        let active = self.active_path();
        if !active.is_file() {
            debug!(path = %active.display(), "nothing to archive");
            return Ok(None);
        }

        let stem = format!("{}_{}", at.format(TIMESTAMP_FORMAT), sanitize_label(label));
        let target = self.unused_archive_path(&stem);
        fs::rename(&active, &target).map_err(|e| TranscriptError::io(&active, e))?;

        debug!(from = %active.display(), to = %target.display(), "transcript archived");
        Ok(Some(target))
    }

    /// `rename` silently replaces an existing file, so pick a name nobody
    /// holds yet.
    fn unused_archive_path(&self, stem: &str) -> PathBuf {
        let mut candidate = self.dir.join(format!("{stem}{ARCHIVE_SUFFIX}"));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{stem}_{n}{ARCHIVE_SUFFIX}"));
            n += 1;
        }
        candidate
    }
}

/// Turn a free-form label into a file name component: anything other than
/// letters, digits and `-` becomes `_`, runs of `_` collapse, and an empty
/// result becomes `untitled`.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.trim().chars() {
        let c = if c.is_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store() -> (TranscriptStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (TranscriptStore::new(dir.path()), dir)
    }

    fn sample() -> Transcript {
        let mut t = Transcript::new();
        t.push_user("What is Rust?");
        t.push_assistant("A systems programming language.");
        t.push_user("thanks");
        t
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn load_without_file_returns_default() {
        let (store, _dir) = store();
        let t = store.load().unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].role, Role::System);
        assert!(!store.exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let (store, _dir) = store();
        let t = sample();
        store.save(&t).unwrap();
        assert_eq!(store.load().unwrap(), t);
    }

    #[test]
    fn save_is_pretty_printed_array() {
        let (store, _dir) = store();
        store.save(&Transcript::new()).unwrap();
        let text = fs::read_to_string(store.active_path()).unwrap();
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"role\": \"system\""));
    }

    #[test]
    fn save_replaces_and_leaves_no_temp_files() {
        let (store, dir) = store();
        store.save(&Transcript::new()).unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(files_in(dir.path()), vec![ACTIVE_FILE.to_string()]);
        assert_eq!(store.load().unwrap().len(), 4);
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::new(dir.path().join("logs").join("nested"));
        store.save(&sample()).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn corrupt_file_is_reported_not_replaced() {
        let (store, _dir) = store();
        fs::write(store.active_path(), "{not json").unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, TranscriptError::Corrupt { .. }));
        assert!(err.is_unreadable());
        assert_eq!(fs::read_to_string(store.active_path()).unwrap(), "{not json");
    }

    #[test]
    fn transcript_without_system_prompt_is_invalid() {
        let (store, _dir) = store();
        fs::write(store.active_path(), "[]").unwrap();
        assert!(matches!(store.load().unwrap_err(), TranscriptError::Invalid { .. }));

        let only_user = serde_json::to_string(&vec![Message::user("hi")]).unwrap();
        fs::write(store.active_path(), only_user).unwrap();
        assert!(matches!(store.load().unwrap_err(), TranscriptError::Invalid { .. }));
    }

    #[test]
    fn archive_without_transcript_is_noop() {
        let (store, dir) = store();
        assert_eq!(store.archive("anything").unwrap(), None);
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn archive_moves_active_file() {
        let (store, dir) = store();
        let t = sample();
        store.save(&t).unwrap();

        let archived = store.archive_at("Rust intro / chat", noon()).unwrap().unwrap();
        assert_eq!(
            archived.file_name().unwrap().to_str().unwrap(),
            "20240305123045_Rust_intro_chat.old.log"
        );
        assert!(!store.exists());
        assert_eq!(files_in(dir.path()).len(), 1);

        let restored: Transcript = serde_json::from_slice(&fs::read(&archived).unwrap()).unwrap();
        assert_eq!(restored, t);
        assert_eq!(store.load().unwrap(), Transcript::new());
    }

    #[test]
    fn archive_never_overwrites_an_earlier_archive() {
        let (store, dir) = store();
        store.save(&sample()).unwrap();
        let first = store.archive_at("same", noon()).unwrap().unwrap();
        store.save(&Transcript::new()).unwrap();
        let second = store.archive_at("same", noon()).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("20240305123045_same_1.old.log"));
        assert_eq!(files_in(dir.path()).len(), 2);
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_label("  Rust Ownership Basics \n"), "Rust_Ownership_Basics");
        assert_eq!(sanitize_label("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_label("\"Greeting exchange.\""), "Greeting_exchange");
        assert_eq!(sanitize_label("rate-limit  help"), "rate-limit_help");
        assert_eq!(sanitize_label(" ... "), "untitled");
        assert_eq!(sanitize_label(""), "untitled");
    }
}
