//! Corpus scans that run before training. Each scan is followed by a reset
//! so the next consumer starts from the first sample.
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::factory::TaggerConfiguration;
use crate::ngram::{build_ngram_dictionary, NGramDictionary};
use crate::sample::SampleStream;
use crate::tag_dictionary::populate_pos_dictionary;

/// Build the n-gram dictionary from one scan, then rewind the stream
pub fn build_ngram_stage<S: SampleStream + ?Sized>(
    samples: &mut S,
    cutoff: usize,
) -> Result<NGramDictionary> {
    info!(cutoff, "Building ngram dictionary");
    let dict = build_ngram_dictionary(samples, cutoff)
        .and_then(|dict| samples.reset().map(|()| dict))
        .map_err(|e| Error::io("building NGram Dictionary", e))?;
    info!(entries = dict.len(), "ngram dictionary done");
    Ok(dict)
}

/// Fail when `config` would hand out tag dictionaries that cannot be
/// extended from the corpus.
pub fn check_population_support(config: &TaggerConfiguration) -> Result<()> {
    let mut dict = config.create_empty_tag_dictionary();
    match dict.as_mutable() {
        Some(_) => Ok(()),
        None => Err(Error::ImmutableTagDictionary),
    }
}

/// Load and/or populate the tag dictionary of `config`.
///
/// Returns whether a tag dictionary was prepared. Population is checked for
/// support before the stream is touched.
pub fn prepare_tag_dictionary<S: SampleStream + ?Sized>(
    samples: &mut S,
    config: &mut TaggerConfiguration,
    path: Option<&Path>,
    cutoff: Option<usize>,
) -> Result<bool> {
    let mut prepared = false;

    if let Some(path) = path {
        info!(path = %path.display(), "Loading POS dictionary");
        let dict = config
            .create_tag_dictionary(path)
            .map_err(|e| Error::io("loading POS Dictionary", e))?;
        config.set_tag_dictionary(dict);
        prepared = true;
    }

    if let Some(cutoff) = cutoff {
        if config.tag_dictionary().is_none() {
            let dict = config.create_empty_tag_dictionary();
            config.set_tag_dictionary(dict);
        }
        let dict = config
            .tag_dictionary_mut()
            .and_then(|dict| dict.as_mutable())
            .ok_or(Error::ImmutableTagDictionary)?;

        info!(cutoff, "Populating POS dictionary");
        populate_pos_dictionary(samples, dict, cutoff)
            .and_then(|()| samples.reset())
            .map_err(|e| Error::io("creating/extending POS Dictionary", e))?;
        prepared = true;
    }

    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{MemorySampleStream, PosSample};
    use crate::tag_dictionary::TagDictionary;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn stream() -> MemorySampleStream {
        MemorySampleStream::new(
            ["the_DT dog_NN", "the_DT cat_NN"]
                .iter()
                .map(|line| line.parse::<PosSample>().unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_ngram_stage_rewinds() {
        let mut samples = stream();
        let dict = build_ngram_stage(&mut samples, 2).unwrap();
        assert!(dict.contains(&["the"]));
        assert!(!dict.contains(&["dog"]));
        assert_eq!(samples.cursor(), 0);
    }

    #[test]
    fn test_ngram_stage_reports_io_context() {
        let mut samples = stream();
        samples.close().unwrap();
        let err = build_ngram_stage(&mut samples, 1).unwrap_err();
        assert!(err.to_string().starts_with("IO error while building NGram Dictionary"));
    }

    #[test]
    fn test_load_then_extend() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "dog VB").unwrap();
        let mut samples = stream();
        let mut config = TaggerConfiguration::create(None, None, None).unwrap();
        let prepared =
            prepare_tag_dictionary(&mut samples, &mut config, Some(file.path()), Some(1)).unwrap();
        assert!(prepared);
        let dict = config.tag_dictionary().unwrap();
        assert_eq!(dict.tags("dog").unwrap(), ["NN", "VB"]);
        assert_eq!(dict.tags("the").unwrap(), ["DT"]);
        assert_eq!(samples.cursor(), 0);
    }

    #[test]
    fn test_frozen_dictionary_is_rejected_before_scan() {
        let mut samples = stream();
        let mut config = TaggerConfiguration::create(Some("frozen"), None, None).unwrap();
        let err = prepare_tag_dictionary(&mut samples, &mut config, None, Some(1)).unwrap_err();
        assert!(matches!(err, Error::ImmutableTagDictionary));
        assert_eq!(samples.cursor(), 0);
    }

    #[test]
    fn test_population_support_follows_factory() {
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        assert!(check_population_support(&config).is_ok());
        let config = TaggerConfiguration::create(Some("frozen"), None, None).unwrap();
        assert!(matches!(
            check_population_support(&config),
            Err(Error::ImmutableTagDictionary)
        ));
    }

    #[test]
    fn test_nothing_requested() {
        let mut samples = stream();
        let mut config = TaggerConfiguration::create(None, None, None).unwrap();
        assert!(!prepare_tag_dictionary(&mut samples, &mut config, None, None).unwrap());
        assert!(config.tag_dictionary().is_none());
    }

    #[test]
    fn test_missing_dictionary_file() {
        let mut samples = stream();
        let mut config = TaggerConfiguration::create(None, None, None).unwrap();
        let err = prepare_tag_dictionary(
            &mut samples,
            &mut config,
            Some(Path::new("/nonexistent/tags.dict")),
            None,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
