use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project root with the video/ and audio/ layout the renderer expects.
///
/// It carries an empty config file so runs never pick up the user's own
/// `~/.config/bulkclip/config.toml`.
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        fs::create_dir_all(temp_dir.path().join("video"))?;
        fs::create_dir_all(temp_dir.path().join("audio"))?;
        fs::write(temp_dir.path().join("test-config.toml"), "")?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn root_arg(&self) -> String {
        self.path().to_string_lossy().to_string()
    }

    pub fn config_arg(&self) -> String {
        self.path()
            .join("test-config.toml")
            .to_string_lossy()
            .to_string()
    }

    /// Media files only need to exist; nothing decodes them in these tests.
    pub fn add_video(&self, name: &str) -> Result<PathBuf> {
        let path = self.path().join("video").join(name);
        fs::write(&path, b"not really a video")?;
        Ok(path)
    }

    pub fn add_audio(&self, name: &str) -> Result<PathBuf> {
        let path = self.path().join("audio").join(name);
        fs::write(&path, b"not really audio")?;
        Ok(path)
    }

    pub fn write_sheet(&self, contents: &str) -> Result<PathBuf> {
        let path = self.path().join("data.csv");
        fs::write(&path, contents)?;
        Ok(path)
    }
}
