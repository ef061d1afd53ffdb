use crate::config::SessionSettings;
use crate::course::Course;
use crate::hint::HintLevel;
use crate::pool::{Advance, PoolAdvancer, PracticePool};
use crate::progress::ProgressStore;
use crate::scores::LetterScores;
use crate::selector::{Bias, PoolSelector, WordSelector};
use crate::word::{Word, WordQueue};
use log::{debug, info, warn};
use std::collections::VecDeque;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Where the per-keystroke state machine stands
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created but not started
    Idle,
    AwaitingInput,
    /// Feedback for an answer is playing; input is ignored until it completes
    Evaluating(Outcome),
    /// The queue ran dry and no word fits the pool
    OutOfWords,
}

/// Notifications for whatever presents the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    LetterAdvanced { letter: char, score: i32 },
    WordCompleted { word: String },
    HintNeeded { letter: char, attempts: u32, level: HintLevel },
    Mistake { expected: char, typed: Option<char> },
    CorrectFeedbackDone,
    IncorrectFeedbackDone,
    PoolExpanded { letter: char },
    OutOfWords,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
enum Deferred {
    CheckPool,
}

/// Everything that changes while a learner plays
#[derive(Debug, Clone)]
pub struct SessionState {
    pub scores: LetterScores,
    pub pool: PracticePool,
    pub queue: WordQueue,
    pub consecutive_correct: u32,
    /// Misses on the current letter
    pub mistake_count: u32,
    pub phase: Phase,
    starved: bool,
}

/// Drives the word queue, scores and practice pool from learner input
pub struct SessionController<S: WordSelector = PoolSelector> {
    course: Course,
    settings: SessionSettings,
    advancer: PoolAdvancer,
    selector: S,
    store: Box<dyn ProgressStore>,
    state: SessionState,
    events: Vec<SessionEvent>,
    deferred: VecDeque<Deferred>,
}

impl<S: WordSelector> SessionController<S> {
    /// Load saved scores, rebuild the pool from them and fill the word queue
    pub fn create(
        course: Course,
        settings: SessionSettings,
        selector: S,
        store: Box<dyn ProgressStore>,
    ) -> Self {
        let letters = &course.letters_to_learn;
        let threshold = settings.learned_threshold;

        let scores = match store.load(&course.storage_key) {
            Ok(Some(saved)) => LetterScores::restore(saved, letters, threshold),
            Ok(None) => LetterScores::initialize(letters, threshold),
            Err(e) => {
                warn!("progress unavailable, playing in memory: {e}");
                LetterScores::initialize(letters, threshold)
            }
        };
        let pool = PracticePool::restore(letters, &scores);

        let mut session = Self {
            advancer: PoolAdvancer::new(settings.consecutive_correct),
            course,
            settings,
            selector,
            store,
            state: SessionState {
                scores,
                pool,
                queue: WordQueue::default(),
                consecutive_correct: 0,
                mistake_count: 0,
                phase: Phase::Idle,
                starved: false,
            },
            events: Vec::new(),
            deferred: VecDeque::new(),
        };

        session.fill_queue();
        if session.state.queue.current().is_none() {
            session.state.phase = Phase::OutOfWords;
        }

        info!(
            "session created for course '{}' with pool [{}]",
            session.course.name, session.state.pool
        );
        session
    }

    /// Open the session for input, hinting the first letter if it is new
    pub fn start(&mut self) {
        if self.state.phase != Phase::Idle {
            return;
        }
        self.state.phase = Phase::AwaitingInput;
        if let Some(letter) = self.current_letter() {
            if !self.state.scores.is_learned(letter) {
                self.events.push(SessionEvent::HintNeeded {
                    letter,
                    attempts: 0,
                    level: HintLevel::Full,
                });
            }
        }
    }

    /// Evaluate a typed letter. Returns false when the input was ignored.
    pub fn submit_input(&mut self, typed: char) -> bool {
        self.evaluate(Some(typed))
    }

    /// Input that did not decode to any letter; always a miss
    pub fn submit_unrecognized(&mut self) -> bool {
        self.evaluate(None)
    }

    /// The presentation of the last answer has finished; accept input again
    pub fn feedback_complete(&mut self) {
        let Phase::Evaluating(outcome) = self.state.phase else {
            return;
        };

        self.events.push(match outcome {
            Outcome::Correct => SessionEvent::CorrectFeedbackDone,
            Outcome::Incorrect => SessionEvent::IncorrectFeedbackDone,
        });

        self.state.phase = if self.state.queue.current().is_some() {
            Phase::AwaitingInput
        } else {
            Phase::OutOfWords
        };
    }

    /// Run work deferred from earlier input
    pub fn on_tick(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::CheckPool => self.check_pool(),
            }
        }
    }

    /// Finish in-flight feedback and deferred work as if time had passed
    pub fn settle(&mut self) {
        self.feedback_complete();
        self.on_tick();
    }

    pub fn has_deferred_work(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn evaluate(&mut self, typed: Option<char>) -> bool {
        if !self.input_ready() {
            debug!("input {typed:?} ignored in phase {:?}", self.state.phase);
            return false;
        }
        let Some(expected) = self.current_letter() else {
            return false;
        };

        if typed == Some(expected) {
            self.on_correct(expected);
        } else {
            self.on_incorrect(expected, typed);
        }
        true
    }

    fn on_correct(&mut self, letter: char) {
        self.state.phase = Phase::Evaluating(Outcome::Correct);
        self.state.mistake_count = 0;
        self.state.consecutive_correct += 1;

        let score = self.state.scores.record_correct(letter);
        self.persist();

        if let Some(word) = self.state.queue.current_mut() {
            word.advance();
        }
        self.events.push(SessionEvent::LetterAdvanced { letter, score });

        if self.state.queue.current().is_some_and(Word::is_complete) {
            if let Some(done) = self.state.queue.complete_current() {
                self.events.push(SessionEvent::WordCompleted { word: done.text() });
            }
            self.fill_queue();
        }

        if !self.deferred.contains(&Deferred::CheckPool) {
            self.deferred.push_back(Deferred::CheckPool);
        }

        if let Some(next) = self.current_letter() {
            if !self.state.scores.is_learned(next) {
                self.events.push(SessionEvent::HintNeeded {
                    letter: next,
                    attempts: 0,
                    level: HintLevel::Full,
                });
            }
        }
    }

    fn on_incorrect(&mut self, expected: char, typed: Option<char>) {
        self.state.phase = Phase::Evaluating(Outcome::Incorrect);
        self.state.mistake_count += 1;
        self.state.consecutive_correct = 0;

        self.state.scores.record_incorrect(expected);
        self.persist();

        let attempts = self.state.mistake_count;
        self.events.push(SessionEvent::Mistake { expected, typed });
        self.events.push(SessionEvent::HintNeeded {
            letter: expected,
            attempts,
            level: HintLevel::for_attempts(attempts),
        });
    }

    fn check_pool(&mut self) {
        let (pool, streak, advance) = self.advancer.maybe_expand(
            &self.state.pool,
            &self.course.letters_to_learn,
            &self.state.scores,
            self.state.consecutive_correct,
        );
        self.state.pool = pool;
        self.state.consecutive_correct = streak;

        if let Advance::Expanded(letter) = advance {
            self.events.push(SessionEvent::PoolExpanded { letter });
            // a bigger pool may unblock a starved queue
            if self.state.starved {
                self.fill_queue();
                if self.state.phase == Phase::OutOfWords && self.state.queue.current().is_some() {
                    self.state.phase = Phase::AwaitingInput;
                }
            }
        }
    }

    /// Top the queue up to the configured number of words. When nothing fits
    /// the pool, widen it along the learning order before giving up.
    fn fill_queue(&mut self) {
        while self.state.queue.remaining() < self.settings.how_many_words_to_start {
            if let Some(word) = self.next_word() {
                self.state.starved = false;
                self.state.queue.push(word);
                continue;
            }

            if self.state.queue.current().is_none() {
                if let Some(letter) = self.state.pool.widen(&self.course.letters_to_learn) {
                    info!("no word fits, widening pool to [{}]", self.state.pool);
                    self.events.push(SessionEvent::PoolExpanded { letter });
                    continue;
                }
            }

            if !self.state.starved {
                self.state.starved = true;
                self.events.push(SessionEvent::OutOfWords);
            }
            break;
        }
    }

    /// Select with the newest-letter bias, falling back to any pool word once
    fn next_word(&mut self) -> Option<Word> {
        let SessionState { pool, scores, .. } = &mut self.state;

        match self
            .selector
            .select_word(pool, &self.course, scores, Bias::NewestUntilLearned)
        {
            Ok(word) => Some(word),
            Err(e) => {
                warn!("{e}; retrying without newest-letter bias");
                self.selector
                    .select_word(pool, &self.course, scores, Bias::Unbiased)
                    .map_err(|e| warn!("{e}"))
                    .ok()
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self
            .store
            .save(&self.course.storage_key, self.state.scores.as_map())
        {
            warn!("progress not saved: {e}");
        }
    }

    pub fn input_ready(&self) -> bool {
        self.state.phase == Phase::AwaitingInput
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn scores(&self) -> &LetterScores {
        &self.state.scores
    }

    pub fn pool(&self) -> &PracticePool {
        &self.state.pool
    }

    pub fn queue(&self) -> &WordQueue {
        &self.state.queue
    }

    pub fn current_word(&self) -> Option<&Word> {
        self.state.queue.current()
    }

    pub fn current_letter(&self) -> Option<char> {
        self.state.queue.current().and_then(Word::current_letter)
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.state.consecutive_correct
    }

    pub fn mistake_count(&self) -> u32 {
        self.state.mistake_count
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn progress_percent(&self) -> u8 {
        self.state
            .scores
            .progress_percent(&self.course.letters_to_learn)
    }
}
