use morse_learn::config::SessionSettings;
use morse_learn::course::Course;
use morse_learn::pool::{Advance, PoolAdvancer, PracticePool};
use morse_learn::progress::{MemoryProgressStore, ProgressStore};
use morse_learn::scores::{LetterScores, LEARNED_THRESHOLD};
use morse_learn::selector::{Bias, PoolSelector, WordSelector};
use morse_learn::session::{SessionController, SessionEvent};

const COURSE: &str = r#"{
    "name": "small",
    "storageKey": "smallScores",
    "lettersToLearn": ["e", "t", "a", "i", "m"],
    "words": ["eat", "ate", "tea", "tie", "mite", "time", "emit", "aim"]
}"#;

fn course() -> Course {
    Course::from_json(COURSE).unwrap()
}

#[test]
fn newest_unlearned_letter_is_always_practiced() {
    let course = course();
    let scores = LetterScores::initialize(&course.letters_to_learn, LEARNED_THRESHOLD);

    for seed in 0..50 {
        let mut pool = PracticePool::new(vec!['e', 't', 'a']);
        let word = PoolSelector::seeded(seed)
            .select_word(&mut pool, &course, &scores, Bias::NewestUntilLearned)
            .unwrap()
            .text();

        assert!(["eat", "ate", "tea"].contains(&word.as_str()), "got {word}");
        assert!(word.contains('a'));
    }
}

#[test]
fn correct_answers_saturate_at_upper_bound() {
    let mut scores = LetterScores::initialize(&['e'], LEARNED_THRESHOLD);

    let first: Vec<i32> = (0..3).map(|_| scores.record_correct('e')).collect();
    assert_eq!(first, vec![1, 2, 3]);

    let more: Vec<i32> = (0..3).map(|_| scores.record_correct('e')).collect();
    assert_eq!(more, vec![4, 4, 4]);
}

#[test]
fn streak_with_learned_last_letter_grows_pool() {
    let course = course();
    let mut scores = LetterScores::initialize(&course.letters_to_learn, LEARNED_THRESHOLD);
    for l in ['e', 't', 'a'] {
        scores.record_correct(l);
        scores.record_correct(l);
    }
    let pool = PracticePool::new(vec!['e', 't', 'a']);

    let (grown, streak, advance) =
        PoolAdvancer::default().maybe_expand(&pool, &course.letters_to_learn, &scores, 3);

    assert_eq!(grown.len(), 4);
    assert_eq!(grown.newest(), Some('i'));
    assert_eq!(streak, 0);
    assert_eq!(advance, Advance::Expanded('i'));
}

#[test]
fn repeated_mistakes_saturate_at_lower_bound() {
    let mut scores = LetterScores::initialize(&['q'], LEARNED_THRESHOLD);

    let seq: Vec<i32> = (0..5).map(|_| scores.record_incorrect('q')).collect();
    assert_eq!(seq, vec![-1, -2, -3, -4, -4]);
}

#[test]
fn completing_a_word_refills_queue_by_one() {
    let mut session = SessionController::create(
        course(),
        SessionSettings::default(),
        PoolSelector::seeded(9),
        Box::new(MemoryProgressStore::new()),
    );
    session.start();
    assert_eq!(session.queue().remaining(), 2);

    let second = session.queue().iter().nth(1).unwrap().text();
    let first = session.current_word().unwrap().text();
    for letter in first.chars() {
        assert!(session.submit_input(letter));
        session.settle();
    }

    assert_eq!(session.queue().remaining(), 2);
    assert_eq!(session.queue().completed(), 1);
    assert_eq!(session.current_word().unwrap().text(), second);
    let completions = session
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::WordCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn scores_saved_after_every_answer() {
    let store = MemoryProgressStore::new();
    let mut session = SessionController::create(
        course(),
        SessionSettings::default(),
        PoolSelector::seeded(4),
        Box::new(store.clone()),
    );
    session.start();

    let letter = session.current_letter().unwrap();
    session.submit_input(letter);
    session.settle();
    session.submit_input('#');
    session.settle();

    assert_eq!(store.save_count(), 2);
    let saved = store.load("smallScores").unwrap().unwrap();
    assert_eq!(&saved, session.scores().as_map());
}

#[test]
fn out_of_range_saved_scores_are_trusted_until_next_answer() {
    let saved = [('e', 9), ('t', -9), ('a', 2)].into_iter().collect();
    let store = MemoryProgressStore::with_scores("smallScores", saved);
    let session = SessionController::create(
        course(),
        SessionSettings::default(),
        PoolSelector::seeded(1),
        Box::new(store),
    );

    assert_eq!(session.scores().get('e'), 9);
    assert_eq!(session.scores().get('t'), -9);
    assert_eq!(session.scores().get('m'), 0);

    let mut scores = session.scores().clone();
    assert_eq!(scores.record_correct('e'), 4);
    assert_eq!(scores.record_incorrect('t'), -4);
}
