use std::collections::{BTreeSet, HashMap};
use std::io;

use tracing::debug;

use crate::sample::SampleStream;

/// Occurrence counts of token n-grams
#[derive(Debug, Clone, Default)]
pub struct NGramModel {
    counts: HashMap<Vec<String>, usize>,
}

impl NGramModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every n-gram of `tokens` with a length in `min_len..=max_len`
    pub fn add<S: AsRef<str>>(&mut self, tokens: &[S], min_len: usize, max_len: usize) {
        let min_len = min_len.max(1);
        for len in min_len..=max_len {
            if len > tokens.len() {
                break;
            }
            for window in tokens.windows(len) {
                let gram = window.iter().map(|t| t.as_ref().to_string()).collect();
                *self.counts.entry(gram).or_insert(0) += 1;
            }
        }
    }

    pub fn count<S: AsRef<str>>(&self, tokens: &[S]) -> usize {
        let gram: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        self.counts.get(&gram).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drop every n-gram whose count lies outside `cutoff_under..=cutoff_over`
    pub fn cut_off(&mut self, cutoff_under: usize, cutoff_over: usize) {
        self.counts
            .retain(|_, count| *count >= cutoff_under && *count <= cutoff_over);
    }

    pub fn to_dictionary(&self) -> NGramDictionary {
        NGramDictionary {
            entries: self.counts.keys().cloned().collect(),
        }
    }
}

/// Set of frequent n-grams seen in a corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NGramDictionary {
    entries: BTreeSet<Vec<String>>,
}

impl NGramDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: AsRef<str>>(&mut self, tokens: &[S]) -> bool {
        self.entries
            .insert(tokens.iter().map(|t| t.as_ref().to_string()).collect())
    }

    pub fn contains<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        let gram: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        self.entries.contains(&gram)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.entries.iter().map(Vec::as_slice)
    }
}

/// Build a dictionary of the words occurring at least `cutoff` times.
///
/// Consumes one full scan of `samples`; the caller resets the stream.
pub fn build_ngram_dictionary<S: SampleStream + ?Sized>(
    samples: &mut S,
    cutoff: usize,
) -> io::Result<NGramDictionary> {
    let mut model = NGramModel::new();
    let mut num_samples = 0usize;
    while let Some(sample) = samples.read()? {
        model.add(sample.words(), 1, 1);
        num_samples += 1;
    }
    model.cut_off(cutoff, usize::MAX);
    let dict = model.to_dictionary();
    debug!(
        samples = num_samples,
        entries = dict.len(),
        cutoff,
        "ngram dictionary built"
    );
    Ok(dict)
}
