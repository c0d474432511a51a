//! Tag dictionaries: the tags a word form is allowed to take.
//!
//! Text format, one entry per line: `word TAG1 TAG2 ...`. Blank lines and
//! lines starting with `#` are skipped. A first line `@case_sensitive=false`
//! makes lookups case-insensitive.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::debug;

use crate::sample::SampleStream;

const CASE_SENSITIVE_DIRECTIVE: &str = "@case_sensitive=";

/// Lookup from word form to permissible tags
pub trait TagDictionary: fmt::Debug {
    /// Tags allowed for `word`, `None` when the word is unknown
    fn tags(&self, word: &str) -> Option<&[String]>;

    fn is_case_sensitive(&self) -> bool;

    /// All entries, ordered by word
    fn entries(&self) -> Vec<(&str, &[String])>;

    /// Incremental population capability, `None` for read-only dictionaries
    fn as_mutable(&mut self) -> Option<&mut dyn MutableTagDictionary> {
        None
    }
}

/// A tag dictionary that can be extended after creation
pub trait MutableTagDictionary: TagDictionary {
    /// Replace the tags of `word`, returning the previous ones
    fn put(&mut self, word: &str, tags: Vec<String>) -> Option<Vec<String>>;
}

fn normalize(word: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        word.to_string()
    } else {
        word.to_lowercase()
    }
}

/// Mutable in-memory tag dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosDictionary {
    entries: BTreeMap<String, Vec<String>>,
    case_sensitive: bool,
}

impl Default for PosDictionary {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PosDictionary {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            entries: BTreeMap::new(),
            case_sensitive,
        }
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut dict = Self::new(true);
        let mut first = true;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if first {
                first = false;
                if let Some(value) = line.strip_prefix(CASE_SENSITIVE_DIRECTIVE) {
                    dict.case_sensitive = value.trim().parse().map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("line {}: invalid case sensitivity '{}'", index + 1, value),
                        )
                    })?;
                    continue;
                }
            }
            let mut fields = line.split_whitespace();
            // `line` is non-empty after trimming, so there is a first field
            let word = fields.next().unwrap_or_default();
            let tags: Vec<String> = fields.map(str::to_string).collect();
            if tags.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: word '{}' has no tags", index + 1, word),
                ));
            }
            dict.put(word, tags);
        }
        Ok(dict)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "{}{}", CASE_SENSITIVE_DIRECTIVE, self.case_sensitive)?;
        for (word, tags) in &self.entries {
            writeln!(writer, "{} {}", word, tags.join(" "))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turn into a read-only dictionary
    pub fn freeze(self) -> FrozenTagDictionary {
        FrozenTagDictionary {
            entries: self.entries,
            case_sensitive: self.case_sensitive,
        }
    }
}

impl TagDictionary for PosDictionary {
    fn tags(&self, word: &str) -> Option<&[String]> {
        self.entries
            .get(&normalize(word, self.case_sensitive))
            .map(Vec::as_slice)
    }

    fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn entries(&self) -> Vec<(&str, &[String])> {
        self.entries
            .iter()
            .map(|(word, tags)| (word.as_str(), tags.as_slice()))
            .collect()
    }

    fn as_mutable(&mut self) -> Option<&mut dyn MutableTagDictionary> {
        Some(self)
    }
}

impl MutableTagDictionary for PosDictionary {
    fn put(&mut self, word: &str, tags: Vec<String>) -> Option<Vec<String>> {
        self.entries
            .insert(normalize(word, self.case_sensitive), tags)
    }
}

/// Read-only tag dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenTagDictionary {
    entries: BTreeMap<String, Vec<String>>,
    case_sensitive: bool,
}

impl FrozenTagDictionary {
    pub fn from_entries<I>(entries: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(word, tags)| (normalize(&word, case_sensitive), tags))
                .collect(),
            case_sensitive,
        }
    }

    /// Read-only copy of any tag dictionary
    pub fn snapshot(dict: &dyn TagDictionary) -> Self {
        Self::from_entries(
            dict.entries()
                .into_iter()
                .map(|(word, tags)| (word.to_string(), tags.to_vec())),
            dict.is_case_sensitive(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TagDictionary for FrozenTagDictionary {
    fn tags(&self, word: &str) -> Option<&[String]> {
        self.entries
            .get(&normalize(word, self.case_sensitive))
            .map(Vec::as_slice)
    }

    fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn entries(&self) -> Vec<(&str, &[String])> {
        self.entries
            .iter()
            .map(|(word, tags)| (word.as_str(), tags.as_slice()))
            .collect()
    }
}

/// Extend `dict` with the tags observed in `samples`.
///
/// A tag is added for a word when the pair occurs at least `cutoff` times;
/// it is merged with the tags the word already has. Words containing a digit
/// are skipped. Consumes one full scan; the caller resets the stream.
pub fn populate_pos_dictionary<S: SampleStream + ?Sized>(
    samples: &mut S,
    dict: &mut dyn MutableTagDictionary,
    cutoff: usize,
) -> io::Result<()> {
    let case_sensitive = dict.is_case_sensitive();
    let mut counts: HashMap<String, BTreeMap<String, usize>> = HashMap::new();
    while let Some(sample) = samples.read()? {
        for (word, tag) in sample.words().iter().zip(sample.tags()) {
            if word.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            *counts
                .entry(normalize(word, case_sensitive))
                .or_default()
                .entry(tag.clone())
                .or_insert(0) += 1;
        }
    }

    let mut updated = 0usize;
    for (word, tag_counts) in counts {
        let mut tags: Vec<String> = tag_counts
            .into_iter()
            .filter(|(_, count)| *count >= cutoff)
            .map(|(tag, _)| tag)
            .collect();
        if tags.is_empty() {
            continue;
        }
        if let Some(existing) = dict.tags(&word) {
            for tag in existing {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        dict.put(&word, tags);
        updated += 1;
    }
    debug!(words = updated, cutoff, "tag dictionary populated");
    Ok(())
}
