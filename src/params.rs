//! Training parameters and algorithm selection.
//!
//! Parameters are a flat string map, loaded from a properties file
//! (`Algorithm=PERCEPTRON`, `Iterations: 50`, `Cutoff 5`, `#` and `!`
//! comments) or synthesized from command line flags.
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

pub const ALGORITHM_PARAM: &str = "Algorithm";
pub const TRAINER_TYPE_PARAM: &str = "TrainerType";
pub const ITERATIONS_PARAM: &str = "Iterations";
pub const CUTOFF_PARAM: &str = "Cutoff";
pub const TOLERANCE_PARAM: &str = "Tolerance";
pub const USE_AVERAGE_PARAM: &str = "UseAverage";
pub const SEED_PARAM: &str = "Seed";

pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_CUTOFF: usize = 5;

pub const EVENT_TRAINER: &str = "Event";
pub const SEQUENCE_TRAINER: &str = "Sequence";

/// Training algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Maximum entropy model trained with generalized iterative scaling
    Maxent,
    /// Averaged perceptron over independent token events
    Perceptron,
    /// Averaged structured perceptron over whole sentences
    PerceptronSequence,
}

impl Algorithm {
    /// Selector used when none is given
    pub const DEFAULT_SELECTOR: &'static str = "maxent";

    /// Map a command line selector to an algorithm.
    ///
    /// Only `maxent`, `perceptron` and `perceptron_sequence` are recognized,
    /// anything else yields `None`.
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector {
            "maxent" => Some(Algorithm::Maxent),
            "perceptron" => Some(Algorithm::Perceptron),
            "perceptron_sequence" => Some(Algorithm::PerceptronSequence),
            _ => None,
        }
    }

    /// Like [`from_selector`](Self::from_selector), falling back to `maxent` when absent
    pub fn resolve(selector: Option<&str>) -> Option<Self> {
        Self::from_selector(selector.unwrap_or(Self::DEFAULT_SELECTOR))
    }

    /// Name stored under [`ALGORITHM_PARAM`]
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Maxent => "MAXENT",
            Algorithm::Perceptron => "PERCEPTRON",
            Algorithm::PerceptronSequence => "PERCEPTRON_SEQUENCE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MAXENT" => Some(Algorithm::Maxent),
            "PERCEPTRON" => Some(Algorithm::Perceptron),
            "PERCEPTRON_SEQUENCE" => Some(Algorithm::PerceptronSequence),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Algorithm::PerceptronSequence)
    }

    pub(crate) fn to_u32(self) -> u32 {
        match self {
            Algorithm::Maxent => 0,
            Algorithm::Perceptron => 1,
            Algorithm::PerceptronSequence => 2,
        }
    }

    pub(crate) fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Algorithm::Maxent),
            1 => Some(Algorithm::Perceptron),
            2 => Some(Algorithm::PerceptronSequence),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Training parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingParameters {
    settings: BTreeMap<String, String>,
}

impl TrainingParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default event-trainer parameters with the given iteration count and cutoff
    pub fn create(iterations: usize, cutoff: usize) -> Self {
        let mut params = Self::new();
        params.put(ALGORITHM_PARAM, Algorithm::Maxent.name());
        params.put(TRAINER_TYPE_PARAM, EVENT_TRAINER);
        params.put(ITERATIONS_PARAM, iterations.to_string());
        params.put(CUTOFF_PARAM, cutoff.to_string());
        params
    }

    /// Parse a properties file.
    ///
    /// The key ends at the first `=`, `:` or whitespace; one `=` or `:`
    /// surrounded by whitespace may follow. A key without a value maps to "".
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut params = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let key_end = line
                .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
                .unwrap_or(line.len());
            let key = &line[..key_end];
            if key.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: empty parameter name", index + 1),
                ));
            }
            let rest = line[key_end..].trim_start();
            let value = rest
                .strip_prefix(|c: char| c == '=' || c == ':')
                .unwrap_or(rest)
                .trim_start();
            params.put(key, value);
        }
        Ok(params)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn put<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    /// Selected algorithm, `Maxent` when unset.
    ///
    /// An unknown name is reported as `InvalidInput`.
    pub fn algorithm(&self) -> io::Result<Algorithm> {
        match self.get(ALGORITHM_PARAM) {
            None => Ok(Algorithm::Maxent),
            Some(name) => Algorithm::from_name(name).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown algorithm '{}'", name),
                )
            }),
        }
    }

    /// True when the parameters select sentence-level training
    pub fn is_sequence_training(&self) -> bool {
        self.get(TRAINER_TYPE_PARAM) == Some(SEQUENCE_TRAINER)
            || self.get(ALGORITHM_PARAM) == Some(Algorithm::PerceptronSequence.name())
    }

    pub fn iterations(&self) -> io::Result<usize> {
        self.parse_or(ITERATIONS_PARAM, DEFAULT_ITERATIONS)
    }

    pub fn cutoff(&self) -> io::Result<usize> {
        self.parse_or(CUTOFF_PARAM, DEFAULT_CUTOFF)
    }

    pub(crate) fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> io::Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid value for {}: '{}'", key, value),
                )
            }),
        }
    }

    /// Check the settings against what the training engine accepts
    pub fn is_valid(&self) -> bool {
        let algorithm = match self.algorithm() {
            Ok(algorithm) => algorithm,
            Err(_) => return false,
        };
        match self.get(TRAINER_TYPE_PARAM) {
            None => {}
            Some(EVENT_TRAINER) if !algorithm.is_sequence() => {}
            Some(SEQUENCE_TRAINER) if algorithm.is_sequence() => {}
            Some(_) => return false,
        }
        match self.iterations() {
            Ok(iterations) if iterations >= 1 => {}
            _ => return false,
        }
        if self.cutoff().is_err() {
            return false;
        }
        match self.parse_or(TOLERANCE_PARAM, 0.0f64) {
            Ok(tolerance) if tolerance >= 0.0 => {}
            _ => return false,
        }
        self.parse_or(USE_AVERAGE_PARAM, true).is_ok() && self.parse_or(SEED_PARAM, 0u64).is_ok()
    }
}

/// Load training parameters from `path`, `Ok(None)` when no path is given.
///
/// With `supports_sequence` false, parameters selecting sentence-level
/// training are rejected.
pub fn load_training_parameters(
    path: Option<&Path>,
    supports_sequence: bool,
) -> Result<Option<TrainingParameters>> {
    let path = match path {
        Some(path) => path,
        None => return Ok(None),
    };
    let file = File::open(path)
        .map_err(|e| Error::io(format!("loading training parameters '{}'", path.display()), e))?;
    // A readable file that does not parse is a settings problem, not an I/O one
    let params = TrainingParameters::from_reader(BufReader::new(file)).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            Error::InvalidTrainingParameters {
                path: path.to_path_buf(),
            }
        } else {
            Error::io(format!("loading training parameters '{}'", path.display()), e)
        }
    })?;
    if !supports_sequence && params.is_sequence_training() {
        return Err(Error::SequenceTrainingUnsupported {
            path: path.to_path_buf(),
        });
    }
    Ok(Some(params))
}
