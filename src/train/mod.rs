//! Training engine for part-of-speech models
//!
//! This module contains the components needed to train a model from a
//! sample stream: contextual predicate generation, feature indexing, the
//! training algorithms and model serialization.

pub(crate) mod context;
mod dataset;
mod feature_gen;
pub(crate) mod model_writer;
mod trainer;

use std::io;

use tracing::debug;

use crate::factory::TaggerConfiguration;
use crate::model::PosModel;
use crate::params::{Algorithm, TrainingParameters};
use crate::sample::SampleStream;

// Re-export public types
pub use self::context::{ContextGenerator, WordShape};
pub use self::trainer::{
    Maxent, MaxentParams, Perceptron, PerceptronParams, PerceptronSequence,
    PerceptronSequenceParams, Trainer, TrainingAlgorithm,
};

/// Train a model from every remaining sample of `samples`.
///
/// The algorithm is selected by the `Algorithm` setting. The stream is read
/// to the end and neither reset nor closed.
pub fn train<S: SampleStream + ?Sized>(
    language: &str,
    samples: &mut S,
    settings: &TrainingParameters,
    config: &TaggerConfiguration,
) -> io::Result<PosModel> {
    match settings.algorithm()? {
        Algorithm::Maxent => train_with::<Maxent, S>(language, samples, settings, config),
        Algorithm::Perceptron => train_with::<Perceptron, S>(language, samples, settings, config),
        Algorithm::PerceptronSequence => {
            train_with::<PerceptronSequence, S>(language, samples, settings, config)
        }
    }
}

fn train_with<A: TrainingAlgorithm, S: SampleStream + ?Sized>(
    language: &str,
    samples: &mut S,
    settings: &TrainingParameters,
    config: &TaggerConfiguration,
) -> io::Result<PosModel> {
    let mut trainer = Trainer::<A>::new();
    trainer.configure(settings)?;

    let contexts = config.context_generator();
    let mut skipped = 0usize;
    while let Some(sample) = samples.read()? {
        if sample.is_empty() {
            skipped += 1;
            continue;
        }
        trainer.append(&sample, &contexts)?;
    }
    debug!(
        sentences = trainer.num_instances(),
        skipped, "training data indexed"
    );

    trainer.train(language, settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ALGORITHM_PARAM;
    use crate::sample::{MemorySampleStream, PosSample};

    fn corpus() -> MemorySampleStream {
        MemorySampleStream::new(
            ["the_DT dog_NN barks_VBZ", "a_DT cat_NN sleeps_VBZ"]
                .iter()
                .map(|line| line.parse::<PosSample>().unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_train_dispatches_on_algorithm() {
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        for algorithm in [
            Algorithm::Maxent,
            Algorithm::Perceptron,
            Algorithm::PerceptronSequence,
        ] {
            let mut settings = TrainingParameters::create(10, 0);
            settings.put(ALGORITHM_PARAM, algorithm.name());
            let mut samples = corpus();
            let model = train("en", &mut samples, &settings, &config).unwrap();
            assert_eq!(model.algorithm(), algorithm);
            assert_eq!(model.language(), "en");
            assert_eq!(model.num_tags(), 3);
            assert!(samples.is_exhausted());
            assert!(!samples.is_closed());
        }
    }

    #[test]
    fn test_train_rejects_unknown_algorithm() {
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        let mut settings = TrainingParameters::new();
        settings.put(ALGORITHM_PARAM, "NAIVE_BAYES");
        let err = train("en", &mut corpus(), &settings, &config).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_train_empty_stream() {
        let config = TaggerConfiguration::create(None, None, None).unwrap();
        let mut samples = MemorySampleStream::new(Vec::new());
        let err = train("en", &mut samples, &TrainingParameters::new(), &config).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
