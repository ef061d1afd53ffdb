use crate::scores::LetterScores;
use itertools::Itertools;
use log::{debug, info};

/// Number of letters a fresh pool starts with
pub const SEED_SIZE: usize = 3;

/// Default streak needed before a new letter is introduced
pub const CONSECUTIVE_CORRECT: u32 = 3;

/// Ordered set of letters eligible for word selection. The last letter is the
/// newest one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PracticePool {
    letters: Vec<char>,
}

impl PracticePool {
    pub fn new(letters: Vec<char>) -> Self {
        Self { letters }
    }

    /// Pool rebuilt from saved scores: every letter up to the last learned one,
    /// so a letter that slipped below the threshold stays in play
    pub fn restore(letters_to_learn: &[char], scores: &LetterScores) -> Self {
        let end = letters_to_learn
            .iter()
            .rposition(|&l| scores.is_learned(l))
            .map_or(0, |i| i + 1);
        Self::new(letters_to_learn[..end].to_vec())
    }

    /// True when the pool holds the first letters of the course, in order
    pub fn is_prefix_of(&self, letters_to_learn: &[char]) -> bool {
        letters_to_learn.starts_with(&self.letters)
    }

    /// Move to the next larger prefix of the learning order: the same size if
    /// the pool has gaps, one letter more otherwise. Returns the newly added
    /// letter, or `None` when the whole course is already in play.
    pub fn widen(&mut self, letters_to_learn: &[char]) -> Option<char> {
        let size = if self.is_prefix_of(letters_to_learn) {
            self.letters.len() + 1
        } else {
            self.letters.len()
        }
        .clamp(SEED_SIZE, letters_to_learn.len().max(SEED_SIZE))
        .min(letters_to_learn.len());

        let widened = &letters_to_learn[..size];
        if widened == self.letters.as_slice() {
            return None;
        }
        let added = widened.iter().copied().find(|&l| !self.contains(l));
        self.letters = widened.to_vec();
        debug!("widened practice pool to [{}]", self.letters.iter().join(""));
        added.or(self.newest())
    }

    /// Reset to the first letters of the course when fewer than three are in play
    pub fn seed_if_short(&mut self, letters_to_learn: &[char]) -> bool {
        if self.letters.len() >= SEED_SIZE {
            return false;
        }
        let size = SEED_SIZE.min(letters_to_learn.len());
        self.letters = letters_to_learn[..size].to_vec();
        debug!("seeded practice pool with [{}]", self.letters.iter().join(""));
        true
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn newest(&self) -> Option<char> {
        self.letters.last().copied()
    }

    pub fn contains(&self, letter: char) -> bool {
        self.letters.contains(&letter)
    }

    /// True when every letter of `word` is in the pool
    pub fn admits(&self, word: &str) -> bool {
        word.chars().all(|c| self.contains(c))
    }
}

impl std::fmt::Display for PracticePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letters.iter().join(""))
    }
}

/// What a pool check decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Pool grew by one; carries the new letter
    Expanded(char),
    /// Criteria met but every course letter is already in play
    Saturated,
    Unchanged,
}

/// Decides when the learner has earned a new letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAdvancer {
    pub consecutive_correct: u32,
}

impl Default for PoolAdvancer {
    fn default() -> Self {
        Self {
            consecutive_correct: CONSECUTIVE_CORRECT,
        }
    }
}

impl PoolAdvancer {
    pub fn new(consecutive_correct: u32) -> Self {
        Self {
            consecutive_correct,
        }
    }

    /// Grow the pool by one letter when the last pooled letter (in learning
    /// order) is learned and the streak is long enough. Returns the new pool,
    /// the new streak counter and what happened.
    pub fn maybe_expand(
        &self,
        pool: &PracticePool,
        letters_to_learn: &[char],
        scores: &LetterScores,
        streak: u32,
    ) -> (PracticePool, u32, Advance) {
        let last_in_play = letters_to_learn
            .iter()
            .copied()
            .filter(|&l| pool.contains(l))
            .last();

        let last_learned = last_in_play.is_some_and(|l| scores.is_learned(l));

        if !last_learned || streak < self.consecutive_correct {
            return (pool.clone(), streak, Advance::Unchanged);
        }

        let new_size = (pool.len() + 1).min(letters_to_learn.len());
        if new_size <= pool.len() {
            debug!("all {} letters already in play", letters_to_learn.len());
            return (pool.clone(), 0, Advance::Saturated);
        }

        let grown = PracticePool::new(letters_to_learn[..new_size].to_vec());
        let added = letters_to_learn[new_size - 1];
        info!("introducing letter '{added}', pool is now [{grown}]");
        (grown, 0, Advance::Expanded(added))
    }
}
