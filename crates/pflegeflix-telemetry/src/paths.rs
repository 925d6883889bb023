//! Path resolution for local tracking state

use std::path::PathBuf;

/// Resolves where the CLI keeps storage, logs and config
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    /// Resolve `~/.pflegeflix`, honouring `PFLEGEFLIX_HOME` when set
    pub fn new() -> std::io::Result<Self> {
        if let Some(root) = std::env::var_os("PFLEGEFLIX_HOME") {
            return Ok(Self::with_root(root));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::with_root(home.join(".pflegeflix")))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory backing the client-local key-value store
    pub fn storage_dir(&self) -> PathBuf {
        self.root.join("storage")
    }

    /// Local funnel event log
    pub fn funnel_log(&self) -> PathBuf {
        self.root.join("funnel_events.jsonl")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("tracking.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_root() {
        let paths = Paths::with_root("/tmp/pf");
        assert!(paths.storage_dir().ends_with("pf/storage"));
        assert!(paths.funnel_log().ends_with("funnel_events.jsonl"));
        assert!(paths.config_file().ends_with("tracking.json"));
    }

    #[test]
    fn test_default_root() {
        if std::env::var_os("PFLEGEFLIX_HOME").is_some() {
            return;
        }
        let paths = Paths::new().unwrap();
        assert!(paths.root.ends_with(".pflegeflix"));
    }
}
