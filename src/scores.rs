use std::collections::BTreeMap;

/// Default score at which a letter counts as learned
pub const LEARNED_THRESHOLD: i32 = 2;

/// Per-letter mastery scores for one course.
///
/// Scores move by one per answer and are clamped to
/// `-(threshold + 2)..=(threshold + 2)` on every update. Values handed to
/// [`LetterScores::restore`] are trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterScores {
    scores: BTreeMap<char, i32>,
    threshold: i32,
}

impl LetterScores {
    /// Fresh scores: every course letter starts at zero
    pub fn initialize(letters: &[char], threshold: i32) -> Self {
        Self {
            scores: letters.iter().map(|&l| (l, 0)).collect(),
            threshold,
        }
    }

    /// Scores loaded from storage. Letters of the course missing from the
    /// persisted map are added at zero; present values pass through unchanged.
    pub fn restore(persisted: BTreeMap<char, i32>, letters: &[char], threshold: i32) -> Self {
        let mut scores = persisted;
        for &letter in letters {
            scores.entry(letter).or_insert(0);
        }
        Self { scores, threshold }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    fn upper_bound(&self) -> i32 {
        self.threshold + 2
    }

    fn lower_bound(&self) -> i32 {
        -(self.threshold + 2)
    }

    /// Score of a letter, zero when it has never been seen
    pub fn get(&self, letter: char) -> i32 {
        self.scores.get(&letter).copied().unwrap_or(0)
    }

    pub fn record_correct(&mut self, letter: char) -> i32 {
        let upper = self.upper_bound();
        let score = self.scores.entry(letter).or_insert(0);
        *score = (*score + 1).min(upper);
        *score
    }

    pub fn record_incorrect(&mut self, letter: char) -> i32 {
        let lower = self.lower_bound();
        let score = self.scores.entry(letter).or_insert(0);
        *score = (*score - 1).max(lower);
        *score
    }

    pub fn is_learned(&self, letter: char) -> bool {
        self.get(letter) >= self.threshold
    }

    /// Learned letters, in the given order
    pub fn learned_in<'a>(&'a self, order: &'a [char]) -> impl Iterator<Item = char> + 'a {
        order.iter().copied().filter(|&l| self.is_learned(l))
    }

    /// Share of the given letters that are learned, 0-100
    pub fn progress_percent(&self, letters: &[char]) -> u8 {
        if letters.is_empty() {
            return 0;
        }
        let learned = self.learned_in(letters).count();
        ((learned as f64 / letters.len() as f64) * 100.0).round() as u8
    }

    /// Opacity of a letter's progress light in the header
    pub fn brightness(&self, letter: char) -> f32 {
        match self.get(letter) {
            1 => 0.4,
            2 => 0.6,
            3 => 0.8,
            4 => 1.0,
            _ => 0.3,
        }
    }

    pub fn as_map(&self) -> &BTreeMap<char, i32> {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, i32)> + '_ {
        self.scores.iter().map(|(&l, &s)| (l, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters() -> Vec<char> {
        vec!['e', 't', 'a', 'i']
    }

    #[test]
    fn test_initialize_sets_all_to_zero() {
        let scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);

        assert_eq!(scores.as_map().len(), 4);
        assert!(scores.iter().all(|(_, s)| s == 0));
    }

    #[test]
    fn test_record_correct_clamps_at_upper_bound() {
        let mut scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);

        let seq: Vec<i32> = (0..3).map(|_| scores.record_correct('e')).collect();
        assert_eq!(seq, vec![1, 2, 3]);

        for _ in 0..3 {
            scores.record_correct('e');
        }
        assert_eq!(scores.get('e'), 4);
    }

    #[test]
    fn test_record_incorrect_clamps_at_lower_bound() {
        let mut scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);

        let seq: Vec<i32> = (0..5).map(|_| scores.record_incorrect('t')).collect();
        assert_eq!(seq, vec![-1, -2, -3, -4, -4]);
    }

    #[test]
    fn test_is_learned_at_threshold() {
        let mut scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);

        scores.record_correct('a');
        assert!(!scores.is_learned('a'));
        scores.record_correct('a');
        assert!(scores.is_learned('a'));
    }

    #[test]
    fn test_restore_trusts_out_of_range_values() {
        let persisted: BTreeMap<char, i32> = [('e', 9), ('t', -7)].into_iter().collect();
        let scores = LetterScores::restore(persisted, &letters(), LEARNED_THRESHOLD);

        assert_eq!(scores.get('e'), 9);
        assert_eq!(scores.get('t'), -7);
        assert_eq!(scores.get('a'), 0);
        assert_eq!(scores.as_map().len(), 4);
    }

    #[test]
    fn test_restored_value_clamps_on_next_update() {
        let persisted: BTreeMap<char, i32> = [('e', 9)].into_iter().collect();
        let mut scores = LetterScores::restore(persisted, &letters(), LEARNED_THRESHOLD);

        assert_eq!(scores.record_correct('e'), 4);
    }

    #[test]
    fn test_custom_threshold_bounds() {
        let mut scores = LetterScores::initialize(&letters(), 5);

        for _ in 0..20 {
            scores.record_correct('i');
        }
        assert_eq!(scores.get('i'), 7);
        for _ in 0..40 {
            scores.record_incorrect('i');
        }
        assert_eq!(scores.get('i'), -7);
    }

    #[test]
    fn test_progress_percent() {
        let mut scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);
        assert_eq!(scores.progress_percent(&letters()), 0);

        scores.record_correct('e');
        scores.record_correct('e');
        assert_eq!(scores.progress_percent(&letters()), 25);
        assert_eq!(scores.progress_percent(&[]), 0);
    }

    #[test]
    fn test_learned_in_preserves_order() {
        let mut scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);
        for l in ['a', 'e'] {
            scores.record_correct(l);
            scores.record_correct(l);
        }

        let learned: Vec<char> = scores.learned_in(&letters()).collect();
        assert_eq!(learned, vec!['e', 'a']);
    }

    #[test]
    fn test_brightness_levels() {
        let mut scores = LetterScores::initialize(&letters(), LEARNED_THRESHOLD);
        assert_eq!(scores.brightness('e'), 0.3);
        scores.record_correct('e');
        assert_eq!(scores.brightness('e'), 0.4);
        scores.record_correct('e');
        scores.record_correct('e');
        scores.record_correct('e');
        assert_eq!(scores.brightness('e'), 1.0);
        scores.record_incorrect('t');
        assert_eq!(scores.brightness('t'), 0.3);
    }
}
