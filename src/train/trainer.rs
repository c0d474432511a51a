use std::io;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::context::ContextGenerator;
use super::dataset::Instance;
use super::feature_gen::FeatureGenerator;
use crate::dictionary::Dictionary;
use crate::factory::TaggerConfiguration;
use crate::feature::{Feature, FeatureType};
use crate::model::PosModel;
use crate::params::{Algorithm, TrainingParameters};
use crate::sample::PosSample;
use crate::tag_dictionary::FrozenTagDictionary;

mod maxent;
mod perceptron;
mod perceptron_sequence;

pub use self::maxent::MaxentParams;
pub use self::perceptron::PerceptronParams;
pub use self::perceptron_sequence::PerceptronSequenceParams;

fn shuffle_indices(indices: &mut [usize], rng: &mut StdRng) {
    indices.shuffle(rng);
}

/// Index of the highest score, the first one on ties
fn argmax(scores: &[f64]) -> u32 {
    let mut best = f64::NEG_INFINITY;
    let mut label = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s > best {
            best = s;
            label = i;
        }
    }
    label as u32
}

fn invalid_input(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.to_string())
}

/// Training algorithm marker for maximum entropy (GIS).
#[derive(Debug, Clone, Copy)]
pub struct Maxent;

/// Training algorithm marker for the event-level averaged perceptron.
#[derive(Debug, Clone, Copy)]
pub struct Perceptron;

/// Training algorithm marker for the sentence-level structured perceptron.
#[derive(Debug, Clone, Copy)]
pub struct PerceptronSequence;

/// Training algorithm interface.
pub trait TrainingAlgorithm {
    type Params: Default;

    const ALGORITHM: Algorithm;

    /// Apply the algorithm's keys of `settings` to `params`
    fn configure(params: &mut Self::Params, settings: &TrainingParameters) -> io::Result<()>;

    fn train(trainer: &mut Trainer<Self>, fgen: &mut FeatureGenerator) -> io::Result<()>
    where
        Self: Sized;
}

/// POS tagger trainer
#[derive(Debug)]
pub struct Trainer<A: TrainingAlgorithm> {
    /// Training instances
    instances: Vec<Instance>,
    /// Predicate dictionary
    preds: Dictionary,
    /// Tag dictionary
    tags: Dictionary,
    /// Minimum predicate frequency
    cutoff: usize,
    /// Training parameters
    params: A::Params,
}

impl<A: TrainingAlgorithm> Default for Trainer<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: TrainingAlgorithm> Trainer<A> {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            preds: Dictionary::new(),
            tags: Dictionary::new(),
            cutoff: 0,
            params: A::Params::default(),
        }
    }

    pub fn params(&self) -> &A::Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut A::Params {
        &mut self.params
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Predicates seen fewer than `cutoff` times are dropped
    pub fn set_cutoff(&mut self, cutoff: usize) {
        self.cutoff = cutoff;
    }

    /// Read the cutoff and the algorithm parameters from `settings`
    pub fn configure(&mut self, settings: &TrainingParameters) -> io::Result<()> {
        self.cutoff = settings.cutoff()?;
        A::configure(&mut self.params, settings)
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    /// Append a training sentence
    pub fn append(&mut self, sample: &PosSample, contexts: &ContextGenerator<'_>) -> io::Result<()> {
        if sample.is_empty() {
            return Err(invalid_input("empty sequences are not allowed"));
        }

        let history = if A::ALGORITHM.is_sequence() {
            None
        } else {
            Some(sample.tags())
        };
        let mut instance = Instance::with_capacity(sample.len());
        for (index, tag) in sample.tags().iter().enumerate() {
            let item = contexts
                .context(sample.words(), index, history)
                .iter()
                .map(|pred| self.preds.get_or_insert(pred))
                .collect();
            let label = self.tags.get_or_insert(tag);
            instance.push(item, label);
        }
        self.instances.push(instance);
        Ok(())
    }

    /// Clear all training data
    pub fn clear(&mut self) {
        self.instances.clear();
        self.preds.clear();
        self.tags.clear();
    }

    /// Train a model from the appended sentences
    pub fn train(
        &mut self,
        language: &str,
        settings: &TrainingParameters,
        config: &TaggerConfiguration,
    ) -> io::Result<PosModel> {
        if self.instances.is_empty() {
            return Err(invalid_input("no training data"));
        }

        let mut fgen = FeatureGenerator::generate(
            &self.instances,
            self.preds.len(),
            self.tags.len(),
            self.cutoff,
            A::ALGORITHM.is_sequence(),
        )?;
        debug!(
            algorithm = %A::ALGORITHM,
            sentences = self.instances.len(),
            predicates = self.preds.len(),
            tags = self.tags.len(),
            features = fgen.num_features(),
            "features generated"
        );

        A::train(self, &mut fgen)?;

        self.build_model(language, settings, config, &fgen)
    }

    /// Collect the non-zero features into a model, renumbering the predicates
    fn build_model(
        &self,
        language: &str,
        settings: &TrainingParameters,
        config: &TaggerConfiguration,
        fgen: &FeatureGenerator,
    ) -> io::Result<PosModel> {
        let mut predicates = Dictionary::new();
        let mut features = Vec::new();
        let mut pred_offsets = vec![0u32];

        for (pid, fids) in fgen.pred_refs.iter().enumerate() {
            let live: Vec<&Feature> = fids
                .iter()
                .map(|&fid| &fgen.features[fid as usize])
                .filter(|f| f.weight != 0.0)
                .collect();
            if live.is_empty() {
                continue;
            }
            let name = self
                .preds
                .get_name(pid as u32)
                .ok_or_else(|| invalid_input("predicate without a name"))?;
            let src = predicates.get_or_insert(name);
            features.extend(live.into_iter().map(|f| Feature {
                src,
                ..f.clone()
            }));
            pred_offsets.push(features.len() as u32);
        }
        features.extend(
            fgen.features
                .iter()
                .filter(|f| f.ftype == FeatureType::Transition && f.weight != 0.0)
                .cloned(),
        );

        debug!(
            predicates = predicates.len(),
            features = features.len(),
            "model assembled"
        );

        Ok(PosModel {
            language: language.to_string(),
            algorithm: A::ALGORITHM,
            manifest: settings.clone(),
            tags: self.tags.clone(),
            predicates,
            features,
            pred_offsets,
            ngram_dictionary: config.ngram_dictionary().cloned(),
            tag_dictionary: config.tag_dictionary().map(FrozenTagDictionary::snapshot),
        })
    }
}

impl Trainer<Maxent> {
    /// Create a new maximum entropy trainer
    pub fn maxent() -> Self {
        Self::new()
    }

    /// Set maximum iterations (builder pattern)
    pub fn with_iterations(mut self, iterations: usize) -> io::Result<Self> {
        self.params.set_iterations(iterations)?;
        Ok(self)
    }

    /// Set convergence tolerance (builder pattern)
    pub fn with_tolerance(mut self, tolerance: f64) -> io::Result<Self> {
        self.params.set_tolerance(tolerance)?;
        Ok(self)
    }
}

impl Trainer<Perceptron> {
    /// Create a new event-level perceptron trainer
    pub fn perceptron() -> Self {
        Self::new()
    }

    /// Set maximum iterations (builder pattern)
    pub fn with_iterations(mut self, iterations: usize) -> io::Result<Self> {
        self.params.set_iterations(iterations)?;
        Ok(self)
    }

    /// Set weight averaging (builder pattern)
    pub fn with_averaging(mut self, enabled: bool) -> Self {
        self.params.set_use_average(enabled);
        self
    }
}

impl Trainer<PerceptronSequence> {
    /// Create a new structured perceptron trainer
    pub fn perceptron_sequence() -> Self {
        Self::new()
    }

    /// Set maximum iterations (builder pattern)
    pub fn with_iterations(mut self, iterations: usize) -> io::Result<Self> {
        self.params.set_iterations(iterations)?;
        Ok(self)
    }

    /// Set the shuffle seed (builder pattern)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.set_seed(Some(seed));
        self
    }
}
