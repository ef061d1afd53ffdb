use std::path::Path;

use morse_learn::config::SessionSettings;
use morse_learn::course::CourseName;
use morse_learn::progress::{BackgroundStore, ProgressStore, SqliteProgressStore};
use morse_learn::selector::PoolSelector;
use morse_learn::session::{Phase, SessionController};
use tempfile::tempdir;

fn open_session(db: &Path, seed: u64) -> SessionController {
    let store = BackgroundStore::spawn(SqliteProgressStore::open(db).unwrap());
    let mut session = SessionController::create(
        CourseName::English.load().unwrap(),
        SessionSettings::default(),
        PoolSelector::seeded(seed),
        Box::new(store),
    );
    session.start();
    session
}

fn type_correctly(session: &mut SessionController, letters: usize) {
    for _ in 0..letters {
        let letter = session.current_letter().unwrap();
        assert!(session.submit_input(letter));
        session.settle();
    }
}

#[test]
fn progress_survives_restart() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("progress.db");

    let (saved_scores, learned): (Vec<(char, i32)>, Vec<char>) = {
        let mut session = open_session(&db, 1);
        type_correctly(&mut session, 60);
        assert!(session.pool().len() > 3);

        let order = session.course().letters_to_learn.clone();
        let learned = session.scores().learned_in(&order).collect();
        (session.scores().iter().collect(), learned)
        // dropping the session flushes the background writer
    };

    let session = open_session(&db, 2);
    assert_eq!(session.scores().iter().collect::<Vec<_>>(), saved_scores);

    // the pool comes back as the course order up to the last learned letter,
    // topped up to three
    let order = &session.course().letters_to_learn;
    let restored = session.pool().letters();
    assert!(order.starts_with(restored));
    assert!(learned.iter().all(|l| restored.contains(l)));
    if restored.len() > 3 {
        assert_eq!(restored.last(), learned.last());
    }
}

#[test]
fn slipped_letter_does_not_lock_restored_session() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("progress.db");
    let key = CourseName::English.load().unwrap().storage_key;

    let saved = [('e', 2), ('t', 1), ('a', 2), ('i', 2)].into_iter().collect();
    SqliteProgressStore::open(&db).unwrap().save(&key, &saved).unwrap();

    let mut session = open_session(&db, 1);
    assert_eq!(session.pool().letters(), &['e', 't', 'a', 'i']);
    assert_eq!(session.phase(), Phase::AwaitingInput);
    assert!(session.queue().remaining() > 0);
    type_correctly(&mut session, 10);
}

#[test]
fn reset_clears_course_progress() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("progress.db");

    {
        let mut session = open_session(&db, 3);
        type_correctly(&mut session, 30);
    }

    let key = CourseName::English.load().unwrap().storage_key;
    SqliteProgressStore::open(&db).unwrap().clear(&key).unwrap();

    let session = open_session(&db, 3);
    assert!(session.scores().iter().all(|(_, s)| s == 0));
    assert_eq!(session.pool().letters(), &['e', 't', 'a']);
}

#[test]
fn database_path_taken_by_directory_is_an_error() {
    let dir = tempdir().unwrap();
    // a directory where the database file should be
    let db = dir.path().join("progress.db");
    std::fs::create_dir_all(&db).unwrap();

    assert!(SqliteProgressStore::open(&db).is_err());
}
