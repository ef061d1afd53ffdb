use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use morse_learn::config::SessionSettings;
use morse_learn::course::CourseName;
use morse_learn::morse::{self, Keyed, MorseKeyer, Signal};
use morse_learn::progress::MemoryProgressStore;
use morse_learn::runtime::{ChannelEventSource, FixedTicker, GameEvent, Runner};
use morse_learn::selector::PoolSelector;
use morse_learn::session::{SessionController, SessionEvent};

fn key(c: char) -> GameEvent {
    GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn create_session() -> SessionController {
    let mut session = SessionController::create(
        CourseName::English.load().unwrap(),
        SessionSettings::default(),
        PoolSelector::seeded(42),
        Box::new(MemoryProgressStore::new()),
    );
    session.start();
    session
}

// A learner that types the expected letter whenever the loop goes quiet,
// driven through the same Runner the terminal app uses.
#[test]
fn headless_typing_completes_words() {
    let mut session = create_session();
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut completed = Vec::new();
    for _ in 0..400u32 {
        match runner.step() {
            GameEvent::Tick => {
                session.feedback_complete();
                session.on_tick();
                if let Some(letter) = session.current_letter() {
                    tx.send(key(letter)).unwrap();
                }
            }
            GameEvent::Key(KeyEvent {
                code: KeyCode::Char(c),
                ..
            }) => {
                session.submit_input(c);
            }
            _ => {}
        }

        for event in session.drain_events() {
            if let SessionEvent::WordCompleted { word } = event {
                completed.push(word);
            }
        }
        if completed.len() >= 5 {
            break;
        }
    }

    assert_eq!(completed.len(), 5, "completed only {completed:?}");
    assert!(session.pool().len() > 3);
}

// Input arriving while feedback is still showing is dropped, not queued.
#[test]
fn headless_burst_input_is_rate_limited() {
    let mut session = create_session();
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let expected = session.current_letter().unwrap();
    for _ in 0..5 {
        tx.send(key(expected)).unwrap();
    }

    let mut accepted = 0;
    for _ in 0..5 {
        if let GameEvent::Key(KeyEvent {
            code: KeyCode::Char(c),
            ..
        }) = runner.step()
        {
            if session.submit_input(c) {
                accepted += 1;
            }
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(session.scores().get(expected), 1);
}

#[test]
fn headless_morse_keying() {
    let mut session = create_session();
    let mut keyer = MorseKeyer::new(Duration::from_millis(20));
    let tick = Duration::from_millis(5);

    for _ in 0..3 {
        let letter = session.current_letter().unwrap();
        for symbol in morse::encode(letter).unwrap().chars() {
            keyer.push(if symbol == '.' { Signal::Dot } else { Signal::Dash });
        }

        let keyed = loop {
            if let Some(keyed) = keyer.on_tick(tick) {
                break keyed;
            }
        };
        assert_eq!(keyed, Keyed::Letter(letter));
        assert!(session.submit_input(letter));
        session.settle();
    }

    assert_eq!(session.consecutive_correct(), 3);
}
