//! Per-line G-code tokenizer
//!
//! A line is split on whitespace after dropping any `;` comment. Each token
//! is a leading letter plus an optional number (`X12.5`, `S300`, bare `X`).

/// One letter/value token
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    pub letter: char,
    pub value: Option<f64>,
}

/// Parse a single token like `G29.2` or `Y`
pub fn parse_word(token: &str) -> Option<Word> {
    let mut chars = token.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_alphabetic() {
        return None;
    }

    let rest = chars.as_str();
    if rest.is_empty() {
        return Some(Word {
            letter,
            value: None,
        });
    }

    let value = rest.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(Word {
        letter,
        value: Some(value),
    })
}

/// Tokens of one non-comment line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineTokens {
    pub words: Vec<Word>,
    /// Tokens that did not look like `<letter><number>`
    pub rejected: usize,
}

impl LineTokens {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Leading command word, e.g. `G0` or `M104`
    pub fn command(&self) -> Option<(char, f64)> {
        let first = self.words.first()?;
        match (first.letter, first.value) {
            (letter @ ('G' | 'M'), Some(number)) => Some((letter, number)),
            _ => None,
        }
    }

    pub fn is_command(&self, letter: char, number: f64) -> bool {
        self.command() == Some((letter, number))
    }

    /// Value of the first word with this letter, skipping the command word
    pub fn value(&self, letter: char) -> Option<f64> {
        self.words
            .iter()
            .skip(1)
            .find(|w| w.letter == letter)
            .and_then(|w| w.value)
    }
}

/// Split a line into words; comment-only or blank lines yield no words
pub fn tokenize(line: &str) -> LineTokens {
    let code = match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let mut tokens = LineTokens::default();
    for token in code.split_whitespace() {
        match parse_word(token) {
            Some(word) => tokens.words.push(word),
            None => tokens.rejected += 1,
        }
    }
    tokens
}
