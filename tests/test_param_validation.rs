use std::io::Write;

use postagger::error::Error;
use postagger::pipeline::resolver::resolve;
use postagger::train::{MaxentParams, PerceptronParams, PerceptronSequenceParams, Trainer};
use postagger::TrainingParameters;
use tempfile::NamedTempFile;

fn settings_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_iterations_validation() {
    let mut params = MaxentParams::default();
    let result = params.set_iterations(0);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "iterations must be at least 1");
    assert!(params.set_iterations(1).is_ok());

    let mut params = PerceptronParams::default();
    assert!(params.set_iterations(0).is_err());
    let mut params = PerceptronSequenceParams::default();
    assert!(params.set_iterations(0).is_err());
}

#[test]
fn test_tolerance_validation() {
    let mut params = PerceptronParams::default();
    let result = params.set_tolerance(-1.0);
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().to_string(), "tolerance must be non-negative");
    assert!(params.set_tolerance(0.0).is_ok());
    assert_eq!(params.tolerance(), 0.0);
}

#[test]
fn test_defaults() {
    assert_eq!(MaxentParams::default().iterations(), 100);
    assert_eq!(MaxentParams::default().tolerance(), 1e-4);
    assert_eq!(PerceptronParams::default().tolerance(), 1e-5);
    assert!(PerceptronParams::default().use_average());
    assert_eq!(PerceptronSequenceParams::default().seed(), None);
}

#[test]
fn test_configure_reads_settings() {
    let mut settings = TrainingParameters::create(30, 2);
    settings.put("Algorithm", "PERCEPTRON");
    settings.put("UseAverage", "false");
    settings.put("Tolerance", "0.001");

    let mut trainer = Trainer::perceptron();
    trainer.configure(&settings).unwrap();
    assert_eq!(trainer.cutoff(), 2);
    assert_eq!(trainer.params().iterations(), 30);
    assert_eq!(trainer.params().tolerance(), 0.001);
    assert!(!trainer.params().use_average());
}

#[test]
fn test_configure_rejects_bad_values() {
    let mut settings = TrainingParameters::create(0, 5);
    settings.put("Algorithm", "MAXENT");
    assert!(Trainer::maxent().configure(&settings).is_err());

    let mut settings = TrainingParameters::create(10, 5);
    settings.put("Seed", "not-a-number");
    assert!(Trainer::perceptron_sequence().configure(&settings).is_err());
}

#[test]
fn test_settings_file_validity() {
    let valid = settings_file("Algorithm=PERCEPTRON\nIterations=50\nCutoff=1\n");
    let source = resolve(Some(valid.path()), 100, 5, Some("maxent")).unwrap();
    assert!(source.is_loaded());
    assert_eq!(source.parameters().iterations().unwrap(), 50);

    for contents in [
        "Algorithm=SVM\n",
        "Iterations=0\n",
        "Cutoff=many\n",
        "Tolerance=-1\n",
        "Algorithm=PERCEPTRON\nTrainerType=Sequence\n",
    ] {
        let file = settings_file(contents);
        let err = resolve(Some(file.path()), 100, 5, None).unwrap_err();
        assert!(
            matches!(err, Error::InvalidTrainingParameters { .. }),
            "{:?} accepted",
            contents
        );
    }
}

#[test]
fn test_sequence_settings_file_is_accepted() {
    let file = settings_file("Algorithm=PERCEPTRON_SEQUENCE\nTrainerType=Sequence\nSeed=3\n");
    let source = resolve(Some(file.path()), 100, 5, None).unwrap();
    assert!(source.parameters().is_sequence_training());
}

#[test]
fn test_missing_settings_file_is_io_error() {
    let err = resolve(
        Some(std::path::Path::new("/nonexistent/pos.params")),
        100,
        5,
        None,
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_whitespace_separated_settings_file() {
    let file = settings_file("# tuned\nAlgorithm PERCEPTRON\nIterations   10\nCutoff:1\n");
    let source = resolve(Some(file.path()), 100, 5, None).unwrap();
    assert!(source.is_loaded());
    assert_eq!(source.parameters().iterations().unwrap(), 10);
    assert_eq!(source.parameters().cutoff().unwrap(), 1);
}

#[test]
fn test_malformed_settings_file_is_configuration_error() {
    let file = settings_file("Iterations=10\n=PERCEPTRON\n");
    let err = resolve(Some(file.path()), 100, 5, None).unwrap_err();
    assert!(matches!(err, Error::InvalidTrainingParameters { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains(&file.path().display().to_string()));
}
