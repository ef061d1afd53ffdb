use crate::app_dirs::AppDirs;
use crate::course::CourseName;
use crate::pool::CONSECUTIVE_CORRECT;
use crate::scores::LEARNED_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub learned_threshold: i32,
    pub consecutive_correct: u32,
    pub how_many_words_to_start: usize,
    pub course: String,
    pub visual_hints: bool,
    pub sound: bool,
    pub speech_hints: bool,
    pub report_interval_secs: u64,
    /// Anonymous identifier attached to progress reports
    pub user_id: Uuid,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            learned_threshold: LEARNED_THRESHOLD,
            consecutive_correct: CONSECUTIVE_CORRECT,
            how_many_words_to_start: 2,
            course: CourseName::English.to_string(),
            visual_hints: true,
            sound: true,
            speech_hints: false,
            report_interval_secs: 60,
            user_id: Uuid::new_v4(),
        }
    }
}

/// The numbers the learning session needs from the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub learned_threshold: i32,
    pub consecutive_correct: u32,
    /// Words kept in the queue, the current one included
    pub how_many_words_to_start: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            learned_threshold: cfg.learned_threshold,
            consecutive_correct: cfg.consecutive_correct,
            how_many_words_to_start: cfg.how_many_words_to_start.max(1),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("morse_learn_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
