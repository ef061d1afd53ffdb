/// Which hint content to present for a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintLevel {
    /// Morse pattern followed by the letter's mnemonic
    Full,
    /// Nothing beyond the letter itself
    Silent,
    MorseOnly,
    MnemonicOnly,
}

impl HintLevel {
    /// Hint content cycles with the number of failed attempts on the current letter
    pub fn for_attempts(attempts: u32) -> Self {
        match attempts % 4 {
            0 => HintLevel::Full,
            1 => HintLevel::Silent,
            2 => HintLevel::MorseOnly,
            _ => HintLevel::MnemonicOnly,
        }
    }

    pub fn shows_morse(&self) -> bool {
        matches!(self, HintLevel::Full | HintLevel::MorseOnly)
    }

    pub fn shows_mnemonic(&self) -> bool {
        matches!(self, HintLevel::Full | HintLevel::MnemonicOnly)
    }
}
