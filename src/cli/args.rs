use clap::Parser;
use std::path::PathBuf;

use postagger::params::{DEFAULT_CUTOFF, DEFAULT_ITERATIONS};
use postagger::pipeline::TrainerParams;

#[derive(Parser, Debug)]
#[command(
    name = "postagger-train",
    version,
    about = "Trains a part-of-speech tagger model"
)]
pub struct CliArgs {
    /// Training parameters file; overrides --iterations, --cutoff and --type
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Number of training iterations
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Minimal number of times a feature must be seen
    #[arg(long, default_value_t = DEFAULT_CUTOFF)]
    pub cutoff: usize,

    /// Algorithm: maxent, perceptron or perceptron_sequence
    #[arg(long = "type", default_value = "maxent")]
    pub algorithm: String,

    /// Build an n-gram dictionary with this cutoff
    #[arg(long)]
    pub ngram: Option<usize>,

    /// Tag dictionary file to load
    #[arg(long)]
    pub dict: Option<PathBuf>,

    /// Populate the tag dictionary from the training data with this cutoff
    #[arg(long)]
    pub tag_dict_cutoff: Option<usize>,

    /// Output model file
    #[arg(long)]
    pub model: PathBuf,

    /// Language of the training data
    #[arg(long)]
    pub lang: String,

    /// Tagger factory: default or frozen
    #[arg(long)]
    pub factory: Option<String>,

    /// Training data, one `word_TAG word_TAG ...` sentence per line
    #[arg(long)]
    pub data: PathBuf,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

impl CliArgs {
    pub fn trainer_params(&self) -> TrainerParams {
        TrainerParams {
            params: self.params.clone(),
            iterations: self.iterations,
            cutoff: self.cutoff,
            algorithm: Some(self.algorithm.clone()),
            ngram_cutoff: self.ngram,
            dict: self.dict.clone(),
            tag_dict_cutoff: self.tag_dict_cutoff,
            model: self.model.clone(),
            lang: self.lang.clone(),
            factory: self.factory.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from([
            "postagger-train",
            "--model",
            "en-pos.bin",
            "--lang",
            "en",
            "--data",
            "train.txt",
        ])
        .unwrap();
        let params = args.trainer_params();
        assert_eq!(params.iterations, 100);
        assert_eq!(params.cutoff, 5);
        assert_eq!(params.algorithm.as_deref(), Some("maxent"));
        assert!(params.ngram_cutoff.is_none());
        assert!(!args.log);
    }

    #[test]
    fn test_all_flags() {
        let args = CliArgs::try_parse_from([
            "postagger-train",
            "--type",
            "perceptron_sequence",
            "--ngram",
            "2",
            "--tag-dict-cutoff",
            "3",
            "--factory",
            "frozen",
            "--model",
            "out.bin",
            "--lang",
            "de",
            "--data",
            "train.txt",
            "--log",
        ])
        .unwrap();
        let params = args.trainer_params();
        assert_eq!(params.algorithm.as_deref(), Some("perceptron_sequence"));
        assert_eq!(params.ngram_cutoff, Some(2));
        assert_eq!(params.tag_dict_cutoff, Some(3));
        assert_eq!(params.factory.as_deref(), Some("frozen"));
        assert!(args.log);
    }

    #[test]
    fn test_model_is_required() {
        assert!(CliArgs::try_parse_from(["postagger-train", "--lang", "en", "--data", "x"]).is_err());
    }
}
