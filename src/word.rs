use std::collections::VecDeque;

/// A lexicon entry in play, with a cursor at the next letter awaiting input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    letters: Vec<char>,
    current_letter_index: usize,
}

impl Word {
    pub fn new(text: &str) -> Self {
        Self {
            letters: text.chars().collect(),
            current_letter_index: 0,
        }
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

    pub fn current_letter_index(&self) -> usize {
        self.current_letter_index
    }

    /// The letter awaiting input, `None` once complete
    pub fn current_letter(&self) -> Option<char> {
        self.letters.get(self.current_letter_index).copied()
    }

    pub fn advance(&mut self) {
        if !self.is_complete() {
            self.current_letter_index += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_letter_index >= self.letters.len()
    }

    pub fn text(&self) -> String {
        self.letters.iter().collect()
    }
}

/// In-flight words. The front word is the one being typed; completed words are
/// dropped and only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordQueue {
    words: VecDeque<Word>,
    completed: usize,
}

impl WordQueue {
    pub fn push(&mut self, word: Word) {
        self.words.push_back(word);
    }

    pub fn current(&self) -> Option<&Word> {
        self.words.front()
    }

    pub fn current_mut(&mut self) -> Option<&mut Word> {
        self.words.front_mut()
    }

    /// Words still to be typed, the current one included
    pub fn remaining(&self) -> usize {
        self.words.len()
    }

    /// Index of the current word over the whole session
    pub fn current_index(&self) -> usize {
        self.completed
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Retire the current word and move on to the next
    pub fn complete_current(&mut self) -> Option<Word> {
        let done = self.words.pop_front()?;
        self.completed += 1;
        Some(done)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }
}
