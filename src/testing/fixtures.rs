//! Test fixtures for building category trees on disk.

use crate::config::GeneratorConfig;
use std::path::Path;
use tempfile::TempDir;

/// A temporary data root.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = DataFixture::new()
///     .with_file("scene/1-season.txt", "winter\nsummer\n")
///     .with_file("camera/1-angle.json", r#"["low angle", "top view"]"#);
/// let store = CategoryStore::open(fixture.config())?;
/// ```
pub struct DataFixture {
    temp_dir: TempDir,
}

impl DataFixture {
    /// Create an empty data root.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Builder form of [`DataFixture::write`].
    #[must_use]
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        self.write(relative, content);
        self
    }

    /// Write a file under the data root, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
        }
        std::fs::write(&path, content).expect("Failed to write fixture file");
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Default configuration rooted at this fixture.
    #[must_use]
    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::with_data_root(self.path())
    }

    /// A tree with data for every category, mixing formats and nesting.
    #[must_use]
    pub fn sample_tree() -> Self {
        Self::new()
            .with_file("scene/1-season.txt", "spring\nsummer\nautumn\nwinter\n")
            .with_file("scene/2-outdoor/1-landscape.txt", "forest\nharbor\ndesert\n")
            .with_file("scene/2-outdoor/2-weather.txt", "light rain\nfog\n")
            .with_file("scene/3-indoor.csv", "item,notes\nlibrary,quiet\n\"tea room, small\",x\n")
            .with_file("motion/1-pose.txt", "standing\nsitting\nleaning forward\n")
            .with_file("facial_action/1-eyes.txt", "eyes closed\nwinking\n")
            .with_file("facial_action/2-mouth.json", r#"["open mouth", "tongue out"]"#)
            .with_file("exp_str/1-levels.txt", "slightly\nvery\nextremely\n")
            .with_file("expression/1-happy.txt", "smiling\nlaughing\n")
            .with_file("expression/2-sad.toml", "items = [\"crying\", \"frowning\"]\n")
            .with_file("lighting/1-natural.txt", "soft light\ngolden hour\n")
            .with_file("lighting/2-studio.txt", "rim light\nbacklight\n")
            .with_file("camera/1-angle.txt", "low angle\nbird's eye view\n")
            .with_file("camera/2-shot.txt", "close-up\nwide shot\n")
            .with_file("style/1-artist/1-painters.txt", "monet\nklimt\n")
            .with_file("style/2-form/1-media.txt", "watercolor\noil painting\n")
            .with_file("description/1-sensory.txt", "dreamlike atmosphere\n")
            .with_file("description/2-detail.txt", "fine brushwork\n")
            .with_file("description/3-quality.txt", "masterful quality\n")
            .with_file("description/4-composition.txt", "dynamic composition\n")
            .with_file("description/5-color.txt", "muted tones\n")
            .with_file("description/6-creativity.txt", "bold imagination\n")
    }
}

impl Default for DataFixture {
    fn default() -> Self {
        Self::new()
    }
}
