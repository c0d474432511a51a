use bitflags::bitflags;

use crate::ngram::NGramDictionary;

const SENTENCE_BEGIN: &str = "*SB*";
const SENTENCE_END: &str = "*SE*";
const AFFIX_LENGTH: usize = 4;

bitflags! {
    /// Orthographic properties of a word
    #[derive(Default)]
    pub struct WordShape: u8 {
        const CAPITALIZED = 0x01;
        const ALL_CAPS = 0x02;
        const HAS_DIGIT = 0x04;
        const HAS_HYPHEN = 0x08;
    }
}

impl WordShape {
    pub fn of(word: &str) -> Self {
        let mut shape = WordShape::empty();
        if word.chars().next().map_or(false, char::is_uppercase) {
            shape |= WordShape::CAPITALIZED;
        }
        if word.chars().any(char::is_alphabetic) && !word.chars().any(char::is_lowercase) {
            shape |= WordShape::ALL_CAPS;
        }
        if word.chars().any(|c| c.is_ascii_digit()) {
            shape |= WordShape::HAS_DIGIT;
        }
        if word.contains('-') {
            shape |= WordShape::HAS_HYPHEN;
        }
        shape
    }
}

/// Token at position `i`, or a sentence boundary marker outside the sentence
fn word_at<W: AsRef<str>>(words: &[W], i: isize) -> &str {
    if i < 0 {
        SENTENCE_BEGIN
    } else if i as usize >= words.len() {
        SENTENCE_END
    } else {
        words[i as usize].as_ref()
    }
}

/// Generates the contextual predicates of a token.
///
/// Words absent from the n-gram dictionary (every word when there is none)
/// are treated as rare and get affix and shape predicates.
#[derive(Debug, Clone, Copy)]
pub struct ContextGenerator<'a> {
    ngram_dictionary: Option<&'a NGramDictionary>,
}

impl<'a> ContextGenerator<'a> {
    pub fn new(ngram_dictionary: Option<&'a NGramDictionary>) -> Self {
        Self { ngram_dictionary }
    }

    fn is_rare(&self, word: &str) -> bool {
        match self.ngram_dictionary {
            Some(dict) => !dict.contains(&[word]),
            None => true,
        }
    }

    /// Predicates for the token at `index`.
    ///
    /// `prev_tags` holds the tags of the tokens before `index` and adds tag
    /// history predicates; sequence models pass `None`.
    pub fn context<W, T>(&self, words: &[W], index: usize, prev_tags: Option<&[T]>) -> Vec<String>
    where
        W: AsRef<str>,
        T: AsRef<str>,
    {
        let word = words[index].as_ref();

        let mut preds = Vec::with_capacity(24);
        preds.push("default".to_string());
        preds.push(format!("w={}", word));

        if self.is_rare(word) {
            let chars: Vec<char> = word.chars().collect();
            for len in 1..=AFFIX_LENGTH.min(chars.len()) {
                let prefix: String = chars[..len].iter().collect();
                let suffix: String = chars[chars.len() - len..].iter().collect();
                preds.push(format!("pre={}", prefix));
                preds.push(format!("suf={}", suffix));
            }
            let shape = WordShape::of(word);
            if shape.contains(WordShape::CAPITALIZED) {
                preds.push("c".to_string());
            }
            if shape.contains(WordShape::ALL_CAPS) {
                preds.push("ac".to_string());
            }
            if shape.contains(WordShape::HAS_DIGIT) {
                preds.push("d".to_string());
            }
            if shape.contains(WordShape::HAS_HYPHEN) {
                preds.push("h".to_string());
            }
        }

        preds.push(format!("p={}", word_at(words, index as isize - 1)));
        preds.push(format!("pp={}", word_at(words, index as isize - 2)));
        preds.push(format!("n={}", word_at(words, index as isize + 1)));
        preds.push(format!("nn={}", word_at(words, index as isize + 2)));

        if let Some(tags) = prev_tags {
            let t1 = word_at(tags, index as isize - 1);
            let t2 = word_at(tags, index as isize - 2);
            preds.push(format!("t={}", t1));
            preds.push(format!("t2={},{}", t2, t1));
        }

        preds
    }
}
