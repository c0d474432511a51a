//! Part-of-speech tagger training
//!
//! This library trains part-of-speech tagging models from `word_TAG`
//! annotated sentences with maximum entropy or perceptron trainers, and
//! reads the resulting models back for tagging. The [`pipeline`] module is
//! the training run behind the `postagger-train` command.
//!
//! # Examples
//!
//! ## Training
//!
//! ```no_run
//! use postagger::pipeline::{TrainerParams, TrainerTool};
//! use postagger::sample::FileSampleStream;
//!
//! let mut params = TrainerParams::new("en-pos.bin", "en");
//! params.algorithm = Some("perceptron".to_string());
//! params.ngram_cutoff = Some(3);
//!
//! let samples = FileSampleStream::open("train.txt")?;
//! TrainerTool::new(params).run(samples)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Tagging
//!
//! ```no_run
//! use postagger::PosModel;
//!
//! let buf = std::fs::read("en-pos.bin")?;
//! let model = PosModel::from_bytes(&buf)?;
//! let tags = model.tagger().tag(&["The", "dog", "barks"]);
//! # Ok::<(), std::io::Error>(())
//! ```

mod dictionary;
mod feature;
mod lattice;
mod model;
mod tagger;

pub mod error;
pub mod factory;
pub mod ngram;
pub mod params;
pub mod pipeline;
pub mod sample;
pub mod tag_dictionary;

/// Training engine: predicate generation, trainers and model serialization
pub mod train;

// Re-export main types
pub use self::dictionary::Dictionary;
pub use self::error::{Error, ErrorKind, Result};
pub use self::feature::{Feature, FeatureType};
pub use self::model::PosModel;
pub use self::params::{Algorithm, TrainingParameters};
pub use self::sample::{PosSample, SampleStream};
pub use self::tagger::Tagger;

// Re-export training types for convenience
pub use self::train::Trainer;
