// Temporary config files

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// A config file in its own temporary directory
pub struct ConfigFixture {
    _temp_dir: TempDir,
    pub path: PathBuf,
}

impl ConfigFixture {
    /// Write `content` to a fresh `ruler.json`
    pub fn new(content: &str) -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("ruler.json");

        let mut file = fs::File::create(&path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(ConfigFixture {
            _temp_dir: temp_dir,
            path,
        })
    }

    /// Path inside the fixture directory that does not exist
    pub fn missing_path(&self) -> PathBuf {
        self.path.with_file_name("missing.json")
    }
}
