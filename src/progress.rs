use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use chrono::Local;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

pub type ScoreMap = BTreeMap<char, i32>;

const PLAYTIME_KEY: &str = "timePlayedGame";

/// Where letter scores and play time live between sessions
pub trait ProgressStore {
    /// Saved scores for a course, `None` when the course was never played
    fn load(&self, course_key: &str) -> Result<Option<ScoreMap>, StoreError>;
    fn save(&self, course_key: &str, scores: &ScoreMap) -> Result<(), StoreError>;
    /// Forget all progress for a course
    fn clear(&self, course_key: &str) -> Result<(), StoreError>;
    fn load_playtime(&self) -> Result<u64, StoreError>;
    fn save_playtime(&self, millis: u64) -> Result<(), StoreError>;
}

/// Lets the session and the play-time counter share one store
impl<T: ProgressStore + ?Sized> ProgressStore for Arc<T> {
    fn load(&self, course_key: &str) -> Result<Option<ScoreMap>, StoreError> {
        (**self).load(course_key)
    }

    fn save(&self, course_key: &str, scores: &ScoreMap) -> Result<(), StoreError> {
        (**self).save(course_key, scores)
    }

    fn clear(&self, course_key: &str) -> Result<(), StoreError> {
        (**self).clear(course_key)
    }

    fn load_playtime(&self) -> Result<u64, StoreError> {
        (**self).load_playtime()
    }

    fn save_playtime(&self, millis: u64) -> Result<(), StoreError> {
        (**self).save_playtime(millis)
    }
}

/// SQLite-backed progress store
#[derive(Debug)]
pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    /// Open the store at the default state directory
    pub fn new() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| "morse_learn.db".into());
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS letter_scores (
                course_key TEXT NOT NULL,
                letter TEXT NOT NULL,
                score INTEGER NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (course_key, letter)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;

        Ok(Self { conn })
    }
}

impl ProgressStore for SqliteProgressStore {
    fn load(&self, course_key: &str) -> Result<Option<ScoreMap>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT letter, score FROM letter_scores WHERE course_key = ?1")?;

        let rows = stmt.query_map([course_key], |row| {
            let letter: String = row.get(0)?;
            let score: i32 = row.get(1)?;
            Ok((letter, score))
        })?;

        let mut scores = ScoreMap::new();
        for row in rows {
            let (letter, score) = row?;
            match letter.chars().next() {
                Some(l) => {
                    scores.insert(l, score);
                }
                None => warn!("skipping score row with an empty letter in '{course_key}'"),
            }
        }

        Ok(if scores.is_empty() { None } else { Some(scores) })
    }

    fn save(&self, course_key: &str, scores: &ScoreMap) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Local::now().to_rfc3339();

        for (letter, score) in scores {
            tx.execute(
                r#"
                INSERT INTO letter_scores (course_key, letter, score, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(course_key, letter) DO UPDATE SET score = ?3, updated_at = ?4
                "#,
                params![course_key, letter.to_string(), score, now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn clear(&self, course_key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM letter_scores WHERE course_key = ?1", [course_key])?;
        Ok(())
    }

    fn load_playtime(&self) -> Result<u64, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [PLAYTIME_KEY], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    fn save_playtime(&self, millis: u64) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![PLAYTIME_KEY, millis.to_string()],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    courses: HashMap<String, ScoreMap>,
    playtime: u64,
    saves: usize,
}

/// In-process store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scores(course_key: &str, scores: ScoreMap) -> Self {
        let store = Self::new();
        store.lock().courses.insert(course_key.to_string(), scores);
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of score saves seen so far
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    pub fn snapshot(&self, course_key: &str) -> Option<ScoreMap> {
        self.lock().courses.get(course_key).cloned()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, course_key: &str) -> Result<Option<ScoreMap>, StoreError> {
        Ok(self.snapshot(course_key))
    }

    fn save(&self, course_key: &str, scores: &ScoreMap) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.courses.insert(course_key.to_string(), scores.clone());
        state.saves += 1;
        Ok(())
    }

    fn clear(&self, course_key: &str) -> Result<(), StoreError> {
        self.lock().courses.remove(course_key);
        Ok(())
    }

    fn load_playtime(&self) -> Result<u64, StoreError> {
        Ok(self.lock().playtime)
    }

    fn save_playtime(&self, millis: u64) -> Result<(), StoreError> {
        self.lock().playtime = millis;
        Ok(())
    }
}

enum WriteJob {
    Scores(String, ScoreMap),
    Playtime(u64),
    /// Runs after any queued saves; the caller waits on the reply
    Clear(String, Sender<Result<(), StoreError>>),
}

type SharedStore = Arc<Mutex<Box<dyn ProgressStore + Send>>>;

/// Hands writes to a worker thread so saving never holds up input handling.
/// Reads go straight to the wrapped store. A clear waits for the saves queued
/// before it. Pending writes are flushed on drop.
pub struct BackgroundStore {
    inner: SharedStore,
    tx: Option<Sender<WriteJob>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundStore {
    pub fn spawn<S: ProgressStore + Send + 'static>(store: S) -> Self {
        let inner: SharedStore = Arc::new(Mutex::new(Box::new(store)));
        let (tx, rx) = mpsc::channel::<WriteJob>();

        let worker_store = Arc::clone(&inner);
        let worker = thread::spawn(move || {
            for job in rx {
                let store = worker_store
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let result = match job {
                    WriteJob::Scores(key, scores) => store.save(&key, &scores),
                    WriteJob::Playtime(ms) => store.save_playtime(ms),
                    WriteJob::Clear(key, reply) => {
                        let _ = reply.send(store.clear(&key));
                        continue;
                    }
                };
                if let Err(e) = result {
                    warn!("progress not saved: {e}");
                }
            }
        });

        Self {
            inner,
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    fn store(&self) -> MutexGuard<'_, Box<dyn ProgressStore + Send>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, job: WriteJob) -> Result<(), StoreError> {
        self.tx
            .as_ref()
            .ok_or(StoreError::WriterClosed)?
            .send(job)
            .map_err(|_| StoreError::WriterClosed)
    }
}

impl ProgressStore for BackgroundStore {
    fn load(&self, course_key: &str) -> Result<Option<ScoreMap>, StoreError> {
        self.store().load(course_key)
    }

    fn save(&self, course_key: &str, scores: &ScoreMap) -> Result<(), StoreError> {
        self.send(WriteJob::Scores(course_key.to_string(), scores.clone()))
    }

    fn clear(&self, course_key: &str) -> Result<(), StoreError> {
        let (reply, done) = mpsc::channel();
        self.send(WriteJob::Clear(course_key.to_string(), reply))?;
        done.recv().map_err(|_| StoreError::WriterClosed)?
    }

    fn load_playtime(&self) -> Result<u64, StoreError> {
        self.store().load_playtime()
    }

    fn save_playtime(&self, millis: u64) -> Result<(), StoreError> {
        self.send(WriteJob::Playtime(millis))
    }
}

impl Drop for BackgroundStore {
    fn drop(&mut self) {
        // closing the channel ends the worker once the queue is drained
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ScoreMap {
        [('e', 3), ('t', -1), ('a', 0)].into_iter().collect()
    }

    #[test]
    fn test_sqlite_roundtrip() {
        let store = SqliteProgressStore::in_memory().unwrap();

        assert_eq!(store.load("english").unwrap(), None);
        store.save("english", &sample()).unwrap();
        assert_eq!(store.load("english").unwrap(), Some(sample()));
    }

    #[test]
    fn test_sqlite_save_overwrites() {
        let store = SqliteProgressStore::in_memory().unwrap();
        store.save("english", &sample()).unwrap();

        let mut updated = sample();
        updated.insert('e', 4);
        store.save("english", &updated).unwrap();

        assert_eq!(store.load("english").unwrap().unwrap()[&'e'], 4);
    }

    #[test]
    fn test_sqlite_courses_are_separate() {
        let store = SqliteProgressStore::in_memory().unwrap();
        store.save("english", &sample()).unwrap();

        assert_eq!(store.load("digits").unwrap(), None);

        store.clear("english").unwrap();
        assert_eq!(store.load("english").unwrap(), None);
    }

    #[test]
    fn test_sqlite_playtime() {
        let store = SqliteProgressStore::in_memory().unwrap();
        assert_eq!(store.load_playtime().unwrap(), 0);

        store.save_playtime(15_000).unwrap();
        store.save_playtime(20_000).unwrap();
        assert_eq!(store.load_playtime().unwrap(), 20_000);
    }

    #[test]
    fn test_sqlite_file_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.db");

        {
            let store = SqliteProgressStore::open(&path).unwrap();
            store.save("english", &sample()).unwrap();
        }

        let reopened = SqliteProgressStore::open(&path).unwrap();
        assert_eq!(reopened.load("english").unwrap(), Some(sample()));
    }

    #[test]
    fn test_memory_store_shared_between_clones() {
        let store = MemoryProgressStore::new();
        let view = store.clone();

        store.save("english", &sample()).unwrap();

        assert_eq!(view.snapshot("english"), Some(sample()));
        assert_eq!(view.save_count(), 1);
    }

    #[test]
    fn test_background_store_flushes_on_drop() {
        let memory = MemoryProgressStore::new();

        {
            let store = BackgroundStore::spawn(memory.clone());
            store.save("english", &sample()).unwrap();
            store.save_playtime(5_000).unwrap();
        }

        assert_eq!(memory.snapshot("english"), Some(sample()));
        assert_eq!(memory.load_playtime().unwrap(), 5_000);
    }

    #[test]
    fn test_shared_store_through_arc() {
        let shared: Arc<dyn ProgressStore> = Arc::new(MemoryProgressStore::new());
        let boxed: Box<dyn ProgressStore> = Box::new(Arc::clone(&shared));

        boxed.save("english", &sample()).unwrap();
        boxed.save_playtime(10_000).unwrap();

        assert_eq!(shared.load("english").unwrap(), Some(sample()));
        assert_eq!(shared.load_playtime().unwrap(), 10_000);
    }

    #[test]
    fn test_sqlite_skips_rows_without_letter() {
        let store = SqliteProgressStore::in_memory().unwrap();
        store.save("english", &sample()).unwrap();
        store
            .conn
            .execute(
                "INSERT INTO letter_scores (course_key, letter, score, updated_at) VALUES ('english', '', 2, '')",
                [],
            )
            .unwrap();

        let loaded = store.load("english").unwrap().unwrap();
        assert_eq!(loaded, sample());
        assert!(!loaded.contains_key(&'\0'));
    }

    #[test]
    fn test_background_clear_runs_after_queued_saves() {
        let memory = MemoryProgressStore::new();
        let store = BackgroundStore::spawn(memory.clone());

        for _ in 0..50 {
            store.save("english", &sample()).unwrap();
        }
        store.clear("english").unwrap();

        assert_eq!(memory.snapshot("english"), None);
        drop(store);
        assert_eq!(memory.snapshot("english"), None);
        assert_eq!(memory.save_count(), 50);
    }

    #[test]
    fn test_background_store_reads_through() {
        let memory = MemoryProgressStore::with_scores("english", sample());
        let store = BackgroundStore::spawn(memory);

        assert_eq!(store.load("english").unwrap(), Some(sample()));
    }
}
