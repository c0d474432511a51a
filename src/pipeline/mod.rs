//! Training pipeline: resolves the parameters, validates the output, runs
//! the optional corpus scans, trains and writes the model.
//!
//! The sample stream is owned by [`TrainerTool::run`] and is closed exactly
//! once whatever the outcome. Scans before training are each followed by a
//! reset; the training scan is the last one.
pub mod persist;
pub mod preprocess;
pub mod resolver;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::factory::TaggerConfiguration;
use crate::model::PosModel;
use crate::params::{TrainingParameters, DEFAULT_CUTOFF, DEFAULT_ITERATIONS};
use crate::sample::SampleStream;
use crate::train;

pub use self::resolver::ParameterSource;

/// Label of the model output in diagnostics
pub const MODEL_LABEL: &str = "pos tagger";

/// Options of one training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerParams {
    /// Training parameters file, overrides `iterations`, `cutoff` and `algorithm`
    pub params: Option<PathBuf>,
    pub iterations: usize,
    pub cutoff: usize,
    /// Algorithm selector: `maxent`, `perceptron` or `perceptron_sequence`
    pub algorithm: Option<String>,
    /// Build an n-gram dictionary with this cutoff
    pub ngram_cutoff: Option<usize>,
    /// Tag dictionary to load
    pub dict: Option<PathBuf>,
    /// Populate the tag dictionary from the corpus with this cutoff
    pub tag_dict_cutoff: Option<usize>,
    pub model: PathBuf,
    pub lang: String,
    /// Tagger factory selector: `default` or `frozen`
    pub factory: Option<String>,
}

impl TrainerParams {
    pub fn new<P: Into<PathBuf>, L: Into<String>>(model: P, lang: L) -> Self {
        Self {
            params: None,
            iterations: DEFAULT_ITERATIONS,
            cutoff: DEFAULT_CUTOFF,
            algorithm: None,
            ngram_cutoff: None,
            dict: None,
            tag_dict_cutoff: None,
            model: model.into(),
            lang: lang.into(),
            factory: None,
        }
    }
}

/// Progress of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ConfigResolved,
    OutputPathValidated,
    NGramBuilt,
    TagDictBuilt,
    Trained,
    Persisted,
    Done,
    Failed,
}

/// Release the stream; a failure here cannot change the outcome of the run.
fn close_stream<S: SampleStream>(mut samples: S) {
    if let Err(e) = samples.close() {
        warn!(error = %e, "failed to close the sample stream");
    }
}

/// Trains a POS tagger model from a sample stream
#[derive(Debug)]
pub struct TrainerTool {
    params: TrainerParams,
    stage: Stage,
}

impl TrainerTool {
    pub fn new(params: TrainerParams) -> Self {
        Self {
            params,
            stage: Stage::Start,
        }
    }

    pub fn params(&self) -> &TrainerParams {
        &self.params
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, stage: Stage) {
        debug!(?stage, "pipeline stage reached");
        self.stage = stage;
    }

    /// Run the pipeline over `samples`, writing the model to the output path.
    ///
    /// Any failure aborts the run and leaves the tool in [`Stage::Failed`].
    pub fn run<S: SampleStream>(&mut self, samples: S) -> Result<()> {
        let result = self.run_stages(samples);
        if result.is_err() {
            self.stage = Stage::Failed;
        }
        result
    }

    fn run_stages<S: SampleStream>(&mut self, mut samples: S) -> Result<()> {
        let (params, config) = match self.prepare(&mut samples) {
            Ok(prepared) => prepared,
            Err(e) => {
                close_stream(samples);
                return Err(e);
            }
        };

        let model = self.invoke_training(samples, &params, &config)?;
        self.advance(Stage::Trained);

        persist::write_model(MODEL_LABEL, &self.params.model, &model)?;
        self.advance(Stage::Persisted);

        self.advance(Stage::Done);
        Ok(())
    }

    /// Every stage before training: parameters, output check and corpus scans
    fn prepare<S: SampleStream>(
        &mut self,
        samples: &mut S,
    ) -> Result<(TrainingParameters, TaggerConfiguration)> {
        let source = resolver::resolve(
            self.params.params.as_deref(),
            self.params.iterations,
            self.params.cutoff,
            self.params.algorithm.as_deref(),
        )?;
        match &source {
            ParameterSource::Loaded { path, .. } => {
                info!(path = %path.display(), "Using training parameters file")
            }
            ParameterSource::Synthesized(params) => {
                info!(settings = ?params.settings(), "Using default training parameters")
            }
        }
        self.advance(Stage::ConfigResolved);

        let model_label = format!("{} model", MODEL_LABEL);
        persist::check_output_file(&model_label, &self.params.model)?;
        self.advance(Stage::OutputPathValidated);

        // Factory and dictionary capability problems surface before any scan
        let mut config = TaggerConfiguration::create(self.params.factory.as_deref(), None, None)?;
        if self.params.tag_dict_cutoff.is_some() {
            preprocess::check_population_support(&config)?;
        }

        if let Some(cutoff) = self.params.ngram_cutoff {
            let dict = preprocess::build_ngram_stage(samples, cutoff)?;
            config.set_ngram_dictionary(dict);
            self.advance(Stage::NGramBuilt);
        }

        let prepared = preprocess::prepare_tag_dictionary(
            samples,
            &mut config,
            self.params.dict.as_deref(),
            self.params.tag_dict_cutoff,
        )?;
        if prepared {
            self.advance(Stage::TagDictBuilt);
        }

        Ok((source.into_parameters(), config))
    }

    /// Train from the final scan, then close the stream.
    fn invoke_training<S: SampleStream>(
        &self,
        mut samples: S,
        params: &TrainingParameters,
        config: &TaggerConfiguration,
    ) -> Result<PosModel> {
        info!(language = %self.params.lang, "Training POS tagger");
        let result = train::train(&self.params.lang, &mut samples, params, config)
            .map_err(|e| Error::io("reading training data or indexing data", e));
        close_stream(samples);
        result
    }
}
