use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::ngram::NGramDictionary;
use crate::tag_dictionary::{PosDictionary, TagDictionary};
use crate::train::ContextGenerator;

/// Flavor of tag dictionaries a configuration creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryFlavor {
    /// [`PosDictionary`], can be populated from the corpus
    Mutable,
    /// [`FrozenTagDictionary`](crate::tag_dictionary::FrozenTagDictionary), read-only
    Frozen,
}

impl DictionaryFlavor {
    pub const DEFAULT_SELECTOR: &'static str = "default";

    fn from_selector(selector: &str) -> Option<Self> {
        match selector {
            "default" => Some(DictionaryFlavor::Mutable),
            "frozen" => Some(DictionaryFlavor::Frozen),
            _ => None,
        }
    }

    pub fn selector(&self) -> &'static str {
        match self {
            DictionaryFlavor::Mutable => "default",
            DictionaryFlavor::Frozen => "frozen",
        }
    }
}

/// Dictionaries handed to the training engine alongside the samples
#[derive(Debug)]
pub struct TaggerConfiguration {
    flavor: DictionaryFlavor,
    ngram_dictionary: Option<NGramDictionary>,
    tag_dictionary: Option<Box<dyn TagDictionary>>,
}

impl TaggerConfiguration {
    /// Create a configuration for the factory named by `selector`.
    ///
    /// `None` selects `default`; unknown selectors are an invalid format.
    pub fn create(
        selector: Option<&str>,
        ngram_dictionary: Option<NGramDictionary>,
        tag_dictionary: Option<Box<dyn TagDictionary>>,
    ) -> Result<Self> {
        let selector = selector.unwrap_or(DictionaryFlavor::DEFAULT_SELECTOR);
        let flavor = DictionaryFlavor::from_selector(selector).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "unknown tagger factory '{}' (expected default or frozen)",
                selector
            ))
        })?;
        Ok(Self {
            flavor,
            ngram_dictionary,
            tag_dictionary,
        })
    }

    pub fn flavor(&self) -> DictionaryFlavor {
        self.flavor
    }

    /// Load a tag dictionary of this configuration's flavor
    pub fn create_tag_dictionary(&self, path: &Path) -> io::Result<Box<dyn TagDictionary>> {
        let dict = PosDictionary::load(path)?;
        Ok(match self.flavor {
            DictionaryFlavor::Mutable => Box::new(dict),
            DictionaryFlavor::Frozen => Box::new(dict.freeze()),
        })
    }

    pub fn create_empty_tag_dictionary(&self) -> Box<dyn TagDictionary> {
        let dict = PosDictionary::new(true);
        match self.flavor {
            DictionaryFlavor::Mutable => Box::new(dict),
            DictionaryFlavor::Frozen => Box::new(dict.freeze()),
        }
    }

    pub fn set_tag_dictionary(&mut self, dict: Box<dyn TagDictionary>) {
        self.tag_dictionary = Some(dict);
    }

    pub fn tag_dictionary(&self) -> Option<&dyn TagDictionary> {
        self.tag_dictionary.as_deref()
    }

    pub fn tag_dictionary_mut(&mut self) -> Option<&mut (dyn TagDictionary + 'static)> {
        self.tag_dictionary.as_deref_mut()
    }

    pub fn set_ngram_dictionary(&mut self, dict: NGramDictionary) {
        self.ngram_dictionary = Some(dict);
    }

    pub fn ngram_dictionary(&self) -> Option<&NGramDictionary> {
        self.ngram_dictionary.as_ref()
    }

    /// Predicate extraction matching this configuration
    pub fn context_generator(&self) -> ContextGenerator<'_> {
        ContextGenerator::new(self.ngram_dictionary.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_unknown_selector() {
        let err = TaggerConfiguration::create(Some("fancy"), None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
        assert!(err.to_string().contains("fancy"));
    }

    #[test]
    fn test_default_flavor_creates_mutable_dictionaries() {
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        assert_eq!(config.flavor(), DictionaryFlavor::Mutable);
        let mut dict = config.create_empty_tag_dictionary();
        assert!(dict.as_mutable().is_some());
    }

    #[test]
    fn test_frozen_flavor_creates_read_only_dictionaries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dog NN").unwrap();
        file.flush().unwrap();

        let mut config = TaggerConfiguration::create(Some("frozen"), None, None).unwrap();
        let mut dict = config.create_tag_dictionary(file.path()).unwrap();
        assert!(dict.as_mutable().is_none());
        assert_eq!(dict.tags("dog").unwrap(), ["NN"]);

        config.set_tag_dictionary(dict);
        assert!(config.tag_dictionary().is_some());
        assert!(config.tag_dictionary_mut().unwrap().as_mutable().is_none());
    }

    #[test]
    fn test_missing_dictionary_file() {
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        assert!(config
            .create_tag_dictionary(Path::new("/nonexistent/tags.dict"))
            .is_err());
    }
}
