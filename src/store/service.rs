use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::store::clock;
use crate::store::connection::{LogStore, StoreError, StoreResult};
use crate::store::models::{ConversationTurn, UserInfo, CONVERSATION_PREFIX, USER_INFO_FILE};

/// Rejects anything that is not a single, plain path component.
pub fn validate_component(name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains('\0')
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

pub fn conversation_file_name(page_type: &str, date: &str) -> String {
    format!("{}{}_{}.json", CONVERSATION_PREFIX, page_type, date)
}

/// Date suffix of a `medical_conversation_<page>_<date>.json` file name.
fn conversation_date(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(CONVERSATION_PREFIX)?
        .strip_suffix(".json")?
        .rsplit('_')
        .next()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, payload: &T) -> StoreResult<()> {
    let text = serde_json::to_string_pretty(payload)?;
    fs::write(path, text)?;
    Ok(())
}

/// Creates `<dir>/<stem>.<ext>`, or `<stem>_1.<ext>`, `<stem>_2.<ext>`, ...
/// when the name is taken. Never truncates an existing file.
fn create_unique(dir: &Path, stem: &str, ext: &str, bytes: &[u8]) -> StoreResult<PathBuf> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}.{}", stem, ext)
        } else {
            format!("{}_{}.{}", stem, attempt, ext)
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

impl LogStore {
    pub fn participant_dir(&self, participant_id: &str) -> StoreResult<PathBuf> {
        Ok(self.root().join(validate_component(participant_id)?))
    }

    pub fn ensure_participant_dir(&self, participant_id: &str) -> StoreResult<PathBuf> {
        let dir = self.participant_dir(participant_id)?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!("Created participant directory {}", dir.display());
        }
        Ok(dir)
    }

    // --- Conversation logs ---

    /// Appends one turn to the participant's per-day log by rewriting the
    /// whole JSON array.
    pub fn append_log(
        &self,
        participant_id: &str,
        page_type: &str,
        date: &str,
        entry: &ConversationTurn,
    ) -> StoreResult<PathBuf> {
        let file_name = conversation_file_name(validate_component(page_type)?, validate_component(date)?);
        let dir = self.ensure_participant_dir(participant_id)?;
        let path = dir.join(file_name);

        let _guard = self.writer();
        let mut logs: Vec<ConversationTurn> = if path.exists() {
            read_json(&path)?
        } else {
            Vec::new()
        };
        logs.push(entry.clone());
        write_json(&path, &logs)?;

        info!("Conversation log saved: {}", path.display());
        Ok(path)
    }

    /// A missing participant or day yields an empty log.
    pub fn read_log(
        &self,
        participant_id: &str,
        page_type: &str,
        date: &str,
    ) -> StoreResult<Vec<ConversationTurn>> {
        let file_name = conversation_file_name(validate_component(page_type)?, validate_component(date)?);
        let path = self.participant_dir(participant_id)?.join(file_name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    /// The log with the most recent date, across page types.
    pub fn latest_conversation_log(&self, participant_id: &str) -> StoreResult<Vec<ConversationTurn>> {
        let dir = self.participant_dir(participant_id)?;
        let latest = self
            .list_files(participant_id)?
            .into_iter()
            .filter(|name| name.starts_with(CONVERSATION_PREFIX) && name.ends_with(".json"))
            .max_by(|a, b| {
                conversation_date(a)
                    .cmp(&conversation_date(b))
                    .then_with(|| a.cmp(b))
            });

        match latest {
            Some(name) => read_json(&dir.join(name)),
            None => Ok(Vec::new()),
        }
    }

    // --- Participant metadata ---

    pub fn write_user_info(&self, info: &UserInfo) -> StoreResult<PathBuf> {
        let dir = self.ensure_participant_dir(&info.participant_id)?;
        let path = dir.join(USER_INFO_FILE);
        write_json(&path, info)?;
        info!("User info saved: {}", path.display());
        Ok(path)
    }

    pub fn read_user_info(&self, participant_id: &str) -> StoreResult<Option<UserInfo>> {
        let path = self.participant_dir(participant_id)?.join(USER_INFO_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    // --- Timestamped singletons ---

    /// Writes `<kind>_<YYYYMMDD_HHMMSS>.json`; an existing file is never
    /// overwritten.
    pub fn write_singleton<T: Serialize + ?Sized>(
        &self,
        participant_id: &str,
        kind: &str,
        payload: &T,
    ) -> StoreResult<PathBuf> {
        let kind = validate_component(kind)?;
        let dir = self.ensure_participant_dir(participant_id)?;
        let text = serde_json::to_string_pretty(payload)?;
        let stem = format!("{}_{}", kind, clock::file_stamp());
        let path = create_unique(&dir, &stem, "json", text.as_bytes())?;
        info!("{} saved: {}", kind, path.display());
        Ok(path)
    }

    fn singleton_names(&self, participant_id: &str, kind: &str) -> StoreResult<Vec<String>> {
        let prefix = format!("{}_", kind);
        Ok(self
            .list_files(participant_id)?
            .into_iter()
            .filter(|name| name.starts_with(&prefix) && name.ends_with(".json"))
            .collect())
    }

    pub fn latest_singleton(&self, participant_id: &str, kind: &str) -> StoreResult<Option<Value>> {
        let dir = self.participant_dir(participant_id)?;
        match self.singleton_names(participant_id, kind)?.last() {
            Some(name) => read_json(&dir.join(name)).map(Some),
            None => Ok(None),
        }
    }

    /// Every `<kind>_*.json` whose name contains `needle`, in name order.
    /// Files that fail to parse are skipped.
    pub fn read_singletons(&self, participant_id: &str, kind: &str, needle: &str) -> StoreResult<Vec<Value>> {
        let dir = self.participant_dir(participant_id)?;
        let mut records = Vec::new();
        for name in self.singleton_names(participant_id, kind)? {
            if !name.contains(needle) {
                continue;
            }
            let path = dir.join(&name);
            match read_json::<Value>(&path) {
                Ok(value) => records.push(value),
                Err(e) => warn!("Skipping unreadable {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }

    // --- Newline-delimited records ---

    pub fn append_ndjson<T: Serialize>(
        &self,
        participant_id: &str,
        kind: &str,
        date: &str,
        record: &T,
    ) -> StoreResult<PathBuf> {
        let file_name = format!("{}_{}.json", validate_component(kind)?, validate_component(date)?);
        let dir = self.ensure_participant_dir(participant_id)?;
        let path = dir.join(file_name);
        let line = serde_json::to_string(record)?;

        let _guard = self.writer();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line)?;
        Ok(path)
    }

    // --- Audio ---

    pub fn write_audio(&self, participant_id: Option<&str>, audio: &[u8]) -> StoreResult<PathBuf> {
        let dir = match participant_id {
            Some(id) => self.ensure_participant_dir(id)?,
            None => self.root().to_path_buf(),
        };
        let stem = format!("audio_{}", clock::file_stamp());
        create_unique(&dir, &stem, "mp3", audio)
    }

    /// Looks in the log root first, then in every participant directory.
    pub fn find_audio(&self, file_name: &str) -> StoreResult<Option<PathBuf>> {
        let file_name = validate_component(file_name)?;
        let direct = self.root().join(file_name);
        if direct.is_file() {
            return Ok(Some(direct));
        }
        for participant in self.list_participants()? {
            let candidate = self.root().join(participant).join(file_name);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    // --- Inspection ---

    /// File names in the participant directory, sorted. Empty when the
    /// participant has no directory yet.
    pub fn list_files(&self, participant_id: &str) -> StoreResult<Vec<String>> {
        let dir = self.participant_dir(participant_id)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn list_participants(&self) -> StoreResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root())? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn read_raw(&self, participant_id: &str, file_name: &str) -> StoreResult<Option<String>> {
        let path = self
            .participant_dir(participant_id)?
            .join(validate_component(file_name)?);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_like_components() {
        assert!(validate_component("p001").is_ok());
        assert!(validate_component("").is_err());
        assert!(validate_component("../etc").is_err());
        assert!(validate_component("a/b").is_err());
        assert!(validate_component("a\\b").is_err());
    }

    #[test]
    fn conversation_date_is_trailing_segment() {
        assert_eq!(conversation_date("medical_conversation_chat_20250101.json"), Some("20250101"));
        assert_eq!(conversation_date("medical_conversation_re_try_20241231.json"), Some("20241231"));
        assert_eq!(conversation_date("feedback_20250101.json"), None);
    }
}
