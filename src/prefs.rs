use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrefsData {
    #[serde(default)]
    last_address: Option<String>,
}

/// The "last submitted address" slot.
///
/// Read once at start-up, written on every accepted submit. Kept apart from the
/// file mirror so clearing one never touches the other.
#[derive(Debug, Clone, Default)]
pub struct Prefs {
    path: Option<PathBuf>,
    data: PrefsData,
}

impl Prefs {
    /// Loads `path` if it exists. A missing or unreadable file yields empty prefs.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Self {
            path: Some(path),
            data,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn last_address(&self) -> Option<&str> {
        self.data.last_address.as_deref()
    }

    pub fn set_last_address(&mut self, address: &str) -> Result<()> {
        self.data.last_address = Some(address.to_string());
        self.save()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let s = serde_json::to_string_pretty(&self.data)?;
        fs::write(path, s).with_context(|| format!("write {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn survives_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");

        let mut p = Prefs::load(&path);
        assert_eq!(p.last_address(), None);
        p.set_last_address("cTaddr").unwrap();

        let p2 = Prefs::load(&path);
        assert_eq!(p2.last_address(), Some("cTaddr"));
    }

    #[test]
    fn corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Prefs::load(&path).last_address(), None);
    }

    #[test]
    fn in_memory_never_touches_disk() {
        let mut p = Prefs::in_memory();
        p.set_last_address("x").unwrap();
        assert_eq!(p.last_address(), Some("x"));
        assert!(p.path().is_none());
    }
}
