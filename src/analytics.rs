use crate::app_dirs::AppDirs;
use crate::config::Config;
use crate::error::ReportError;
use crate::progress::ScoreMap;
use crate::selector::WordSelector;
use crate::session::SessionController;
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Play time is counted in whole units of this length
pub const PLAYTIME_UNIT: Duration = Duration::from_secs(5);

/// Progress at a point in time, as sent to the reporter
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub user_id: Uuid,
    pub course_key: String,
    pub scores: ScoreMap,
    pub progress_percent: u8,
    pub time_played_ms: u64,
    pub taken_at: DateTime<Local>,
    pub visual_hints: bool,
    pub speech_hints: bool,
    pub sound: bool,
    pub learned_threshold: i32,
    pub consecutive_correct: u32,
}

impl ProgressSnapshot {
    pub fn capture<S: WordSelector>(
        session: &SessionController<S>,
        cfg: &Config,
        time_played_ms: u64,
    ) -> Self {
        Self {
            user_id: cfg.user_id,
            course_key: session.course().storage_key.clone(),
            scores: session.scores().as_map().clone(),
            progress_percent: session.progress_percent(),
            time_played_ms,
            taken_at: Local::now(),
            visual_hints: cfg.visual_hints,
            speech_hints: cfg.speech_hints,
            sound: cfg.sound,
            learned_threshold: session.settings().learned_threshold,
            consecutive_correct: session.settings().consecutive_correct,
        }
    }

    pub fn to_row(&self) -> Result<ProgressRow, ReportError> {
        let settings = serde_json::json!({
            "course": self.course_key,
            "learnedThreshold": self.learned_threshold,
            "consecutiveCorrect": self.consecutive_correct,
        });

        Ok(ProgressRow {
            user_identifier: self.user_id.to_string(),
            progress_dump: serde_json::to_string(&self.scores)?,
            progress_percent: self.progress_percent,
            time_played: self.time_played_ms,
            date_created: self.taken_at.to_rfc3339(),
            visual_hints: self.visual_hints,
            speech_hints: self.speech_hints,
            sound: self.sound,
            settings_dump: serde_json::to_string(&settings)?,
        })
    }
}

/// One line of the progress log
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRow {
    pub user_identifier: String,
    pub progress_dump: String,
    pub progress_percent: u8,
    pub time_played: u64,
    pub date_created: String,
    pub visual_hints: bool,
    pub speech_hints: bool,
    pub sound: bool,
    pub settings_dump: String,
}

pub trait Reporter {
    fn report(&self, snapshot: &ProgressSnapshot) -> Result<(), ReportError>;
}

/// Appends snapshots to a CSV file, writing the header on first use
#[derive(Debug, Clone)]
pub struct CsvReporter {
    path: PathBuf,
}

impl CsvReporter {
    pub fn new() -> Self {
        let path = AppDirs::report_path().unwrap_or_else(|| PathBuf::from("progress_log.csv"));
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

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for CsvReporter {
    fn report(&self, snapshot: &ProgressSnapshot) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(snapshot.to_row()?)?;
        writer.flush()?;
        Ok(())
    }
}

/// Accumulates active play time in whole units
#[derive(Debug, Clone)]
pub struct PlaytimeTracker {
    total_ms: u64,
    pending: Duration,
    paused: bool,
}

impl PlaytimeTracker {
    pub fn new(total_ms: u64) -> Self {
        Self {
            total_ms,
            pending: Duration::ZERO,
            paused: false,
        }
    }

    /// Returns true when a whole unit was added and the total should be saved
    pub fn on_tick(&mut self, elapsed: Duration) -> bool {
        if self.paused {
            return false;
        }
        self.pending += elapsed;

        let mut added = false;
        while self.pending >= PLAYTIME_UNIT {
            self.pending -= PLAYTIME_UNIT;
            self.total_ms += PLAYTIME_UNIT.as_millis() as u64;
            added = true;
        }
        added
    }

    /// Stop counting, dropping any partial unit
    pub fn pause(&mut self) {
        self.paused = true;
        self.pending = Duration::ZERO;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }
}

/// Sends a snapshot every `interval`. Reporting failures are logged and dropped.
pub struct AnalyticsScheduler {
    interval: Duration,
    since_last: Duration,
    reporter: Box<dyn Reporter>,
}

impl AnalyticsScheduler {
    /// A zero interval turns reporting off
    pub fn new(interval: Duration, reporter: Box<dyn Reporter>) -> Self {
        Self {
            interval,
            since_last: Duration::ZERO,
            reporter,
        }
    }

    pub fn enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Advance the clock; `snapshot` is only built when a report is due
    pub fn on_tick<F>(&mut self, elapsed: Duration, snapshot: F) -> bool
    where
        F: FnOnce() -> ProgressSnapshot,
    {
        if !self.enabled() {
            return false;
        }
        self.since_last += elapsed;
        if self.since_last < self.interval {
            return false;
        }
        self.since_last = Duration::ZERO;
        self.send(&snapshot())
    }

    /// Report right away, e.g. on quit
    pub fn flush(&mut self, snapshot: &ProgressSnapshot) -> bool {
        if !self.enabled() {
            return false;
        }
        self.since_last = Duration::ZERO;
        self.send(snapshot)
    }

    fn send(&self, snapshot: &ProgressSnapshot) -> bool {
        match self.reporter.report(snapshot) {
            Ok(()) => {
                debug!("progress reported ({}%)", snapshot.progress_percent);
                true
            }
            Err(e) => {
                warn!("progress report failed: {e}");
                false
            }
        }
    }
}
