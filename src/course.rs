use crate::error::StoreError;
use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::HashMap;

static COURSE_DIR: Dir = include_dir!("src/courses");

/// Courses bundled with the binary
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CourseName {
    English,
    Digits,
}

impl CourseName {
    pub fn load(&self) -> Result<Course, StoreError> {
        Course::from_embedded(&self.to_string())
    }
}

/// A set of letters to learn, in learning order, plus the lexicon drawn from them
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    /// Key under which letter scores are persisted
    pub storage_key: String,
    pub letters_to_learn: Vec<char>,
    #[serde(default)]
    pub letter_names: HashMap<char, String>,
    pub words: Vec<String>,
}

impl Course {
    pub fn from_embedded(name: &str) -> Result<Self, StoreError> {
        let file = COURSE_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| StoreError::CourseNotFound(name.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| StoreError::CourseNotFound(name.to_string()))?;

        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Lexicon provider: the fixed candidate words for this course
    pub fn get_words(&self) -> &[String] {
        &self.words
    }

    pub fn total_letters(&self) -> usize {
        self.letters_to_learn.len()
    }

    pub fn contains_letter(&self, letter: char) -> bool {
        self.letters_to_learn.contains(&letter)
    }

    /// Spoken/display name of a letter; letters without a name are their own name
    pub fn letter_name(&self, letter: char) -> String {
        self.letter_names
            .get(&letter)
            .cloned()
            .unwrap_or_else(|| letter.to_string())
    }

    /// Letters in alphabetical order, as the progress header shows them
    pub fn sorted_letters(&self) -> Vec<char> {
        let mut letters = self.letters_to_learn.clone();
        letters.sort_unstable();
        letters
    }
}
