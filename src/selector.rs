use crate::{
    course::Course, error::StarvationError, pool::PracticePool, scores::LetterScores, word::Word,
};
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Whether selection should favour the newest pool letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Only words containing the newest letter, until that letter is learned
    NewestUntilLearned,
    /// Any word made of pool letters
    Unbiased,
}

/// Trait for word selection strategies
pub trait WordSelector {
    /// Pick the next word to present. A pool with fewer than three letters is
    /// first reset to the start of the course's learning order.
    fn select_word(
        &mut self,
        pool: &mut PracticePool,
        course: &Course,
        scores: &LetterScores,
        bias: Bias,
    ) -> Result<Word, StarvationError>;
}

/// Shuffles the lexicon on every call and takes the first word that fits the pool
pub struct PoolSelector<R: Rng = StdRng> {
    rng: R,
}

impl PoolSelector<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PoolSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> WordSelector for PoolSelector<R> {
    fn select_word(
        &mut self,
        pool: &mut PracticePool,
        course: &Course,
        scores: &LetterScores,
        bias: Bias,
    ) -> Result<Word, StarvationError> {
        let mut shuffled: Vec<&String> = course.get_words().iter().collect();
        shuffled.shuffle(&mut self.rng);

        pool.seed_if_short(&course.letters_to_learn);
        let newest = pool.newest();

        let required = match bias {
            Bias::NewestUntilLearned => newest.filter(|&l| !scores.is_learned(l)),
            Bias::Unbiased => None,
        };

        match first_eligible(shuffled, pool, required) {
            Some(word) => {
                debug!("selected '{word}' from pool [{pool}] (required {required:?})");
                Ok(Word::new(word))
            }
            None => Err(StarvationError {
                pool: pool.to_string(),
                newest,
                biased: required.is_some(),
            }),
        }
    }
}

/// First candidate, in order, made only of pool letters and containing
/// `required` when given
pub fn first_eligible<'a, I>(candidates: I, pool: &PracticePool, required: Option<char>) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    candidates
        .into_iter()
        .filter(|w| pool.admits(w))
        .find(|w| required.map_or(true, |l| w.contains(l)))
        .map(String::as_str)
}
