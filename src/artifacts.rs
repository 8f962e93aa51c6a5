use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Best-effort dumps of raw upstream payloads for inspecting shape changes.
/// Nothing here is authoritative and no failure is propagated.
#[derive(Debug, Clone)]
pub struct DebugArtifacts {
    dir: PathBuf,
}

impl DebugArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DebugArtifacts { dir: dir.into() }
    }

    pub fn discovery_path(&self) -> PathBuf {
        self.dir.join("last_api.json")
    }

    pub fn lobby_path(&self) -> PathBuf {
        self.dir.join("lobby.json")
    }

    pub fn save_discovery<T: Serialize>(&self, payload: &T) {
        dump(&self.discovery_path(), payload);
    }

    pub fn save_lobby<T: Serialize>(&self, capture: &T) {
        dump(&self.lobby_path(), capture);
    }
}

fn dump<T: Serialize>(path: &Path, value: &T) {
    let result = (|| -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(value)?)?;
        Ok(())
    })();
    match result {
        Ok(()) => debug!("Wrote debug artifact {}", path.display()),
        Err(e) => warn!("Could not write debug artifact {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_dumps_pretty_json() {
        let tmp = TempDir::new().unwrap();
        let a = DebugArtifacts::new(tmp.path().join("debug"));
        a.save_discovery(&json!({"events": {"34848333": {}}}));

        let text = fs::read_to_string(a.discovery_path()).unwrap();
        assert!(text.contains('\n'));
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(back["events"]["34848333"].is_object());
    }

    #[test]
    fn test_unwritable_location_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not-a-dir");
        fs::write(&file, b"x").unwrap();

        let a = DebugArtifacts::new(&file);
        a.save_lobby(&json!([]));

        assert!(!a.lobby_path().exists());
    }
}
