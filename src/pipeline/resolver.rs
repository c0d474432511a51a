use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::params::{
    load_training_parameters, Algorithm, TrainingParameters, ALGORITHM_PARAM, SEQUENCE_TRAINER,
    TRAINER_TYPE_PARAM,
};

/// Where the effective training parameters came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSource {
    /// Read from a settings file; the individual flags were ignored
    Loaded {
        path: PathBuf,
        params: TrainingParameters,
    },
    /// Built from the iteration, cutoff and algorithm flags
    Synthesized(TrainingParameters),
}

impl ParameterSource {
    pub fn parameters(&self) -> &TrainingParameters {
        match self {
            ParameterSource::Loaded { params, .. } => params,
            ParameterSource::Synthesized(params) => params,
        }
    }

    pub fn into_parameters(self) -> TrainingParameters {
        match self {
            ParameterSource::Loaded { params, .. } => params,
            ParameterSource::Synthesized(params) => params,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ParameterSource::Loaded { .. })
    }
}

/// Resolve the training parameters of a run.
///
/// A settings file wins wholesale and must pass validation. Without one the
/// parameters are synthesized from `iterations`, `cutoff` and the algorithm
/// `selector` (`maxent` when absent).
pub fn resolve(
    settings: Option<&Path>,
    iterations: usize,
    cutoff: usize,
    selector: Option<&str>,
) -> Result<ParameterSource> {
    if let Some(path) = settings {
        if let Some(params) = load_training_parameters(Some(path), true)? {
            if !params.is_valid() {
                return Err(Error::InvalidTrainingParameters {
                    path: path.to_path_buf(),
                });
            }
            return Ok(ParameterSource::Loaded {
                path: path.to_path_buf(),
                params,
            });
        }
    }

    let algorithm = Algorithm::resolve(selector).ok_or_else(|| Error::UnknownAlgorithm {
        selector: selector.unwrap_or_default().to_string(),
    })?;
    let mut params = TrainingParameters::create(iterations, cutoff);
    params.put(ALGORITHM_PARAM, algorithm.name());
    if algorithm.is_sequence() {
        params.put(TRAINER_TYPE_PARAM, SEQUENCE_TRAINER);
    }
    Ok(ParameterSource::Synthesized(params))
}
