use std::time::Duration;

/// Idle time after the last signal before the keyer commits on its own
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

const CODE_TABLE: &[(char, &str)] = &[
    ('a', ".-"),
    ('b', "-..."),
    ('c', "-.-."),
    ('d', "-.."),
    ('e', "."),
    ('f', "..-."),
    ('g', "--."),
    ('h', "...."),
    ('i', ".."),
    ('j', ".---"),
    ('k', "-.-"),
    ('l', ".-.."),
    ('m', "--"),
    ('n', "-."),
    ('o', "---"),
    ('p', ".--."),
    ('q', "--.-"),
    ('r', ".-."),
    ('s', "..."),
    ('t', "-"),
    ('u', "..-"),
    ('v', "...-"),
    ('w', ".--"),
    ('x', "-..-"),
    ('y', "-.--"),
    ('z', "--.."),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('0', "-----"),
];

// picture words shown next to a letter while it is being learned
const MNEMONICS: &[(char, &str)] = &[
    ('a', "Archery"),
    ('b', "Banjo"),
    ('c', "Candy"),
    ('d', "Dog"),
    ('e', "Eye"),
    ('f', "Firetruck"),
    ('g', "Giraffe"),
    ('h', "Hippo"),
    ('i', "Insect"),
    ('j', "Jet"),
    ('k', "Kite"),
    ('l', "Laboratory"),
    ('m', "Mustache"),
    ('n', "Net"),
    ('o', "Orchestra"),
    ('p', "Paddle"),
    ('q', "Quarterback"),
    ('r', "Robot"),
    ('s', "Submarine"),
    ('t', "Tape"),
    ('u', "Unicorn"),
    ('v', "Vacuum"),
    ('w', "Wand"),
    ('x', "X-ray"),
    ('y', "Yard"),
    ('z', "Zebra"),
];

/// Morse pattern of a letter, e.g. `".-"` for `'a'`
pub fn encode(letter: char) -> Option<&'static str> {
    let letter = letter.to_ascii_lowercase();
    CODE_TABLE
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, code)| *code)
}

pub fn decode(code: &str) -> Option<char> {
    CODE_TABLE.iter().find(|(_, c)| *c == code).map(|(l, _)| *l)
}

pub fn mnemonic(letter: char) -> Option<&'static str> {
    let letter = letter.to_ascii_lowercase();
    MNEMONICS
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, word)| *word)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Dot,
    Dash,
}

impl Signal {
    fn symbol(&self) -> char {
        match self {
            Signal::Dot => '.',
            Signal::Dash => '-',
        }
    }
}

/// Result of committing the keyed signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyed {
    Letter(char),
    /// The pattern is not a known letter
    Unrecognized,
}

/// Collects dots and dashes and turns them into a letter
#[derive(Debug, Clone)]
pub struct MorseKeyer {
    buffer: String,
    idle: Duration,
    debounce: Duration,
}

impl Default for MorseKeyer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl MorseKeyer {
    pub fn new(debounce: Duration) -> Self {
        Self {
            buffer: String::new(),
            idle: Duration::ZERO,
            debounce,
        }
    }

    pub fn push(&mut self, signal: Signal) {
        self.buffer.push(signal.symbol());
        self.idle = Duration::ZERO;
    }

    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop the last signal
    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    /// Decode and clear the buffer; `None` when nothing was keyed
    pub fn commit(&mut self) -> Option<Keyed> {
        if self.buffer.is_empty() {
            return None;
        }
        let code = std::mem::take(&mut self.buffer);
        self.idle = Duration::ZERO;
        Some(decode(&code).map_or(Keyed::Unrecognized, Keyed::Letter))
    }

    /// Advance the idle clock, committing once the debounce has elapsed
    pub fn on_tick(&mut self, elapsed: Duration) -> Option<Keyed> {
        if self.buffer.is_empty() {
            return None;
        }
        self.idle += elapsed;
        if self.idle >= self.debounce {
            self.commit()
        } else {
            None
        }
    }
}
