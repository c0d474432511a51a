use std::io;

use tracing::debug;

use super::super::feature_gen::FeatureGenerator;
use super::{Perceptron, Trainer, TrainingAlgorithm};
use crate::params::{
    Algorithm, TrainingParameters, ITERATIONS_PARAM, TOLERANCE_PARAM, USE_AVERAGE_PARAM,
};

/// Event-level perceptron training parameters.
#[derive(Debug, Clone)]
pub struct PerceptronParams {
    iterations: usize,
    tolerance: f64,
    use_average: bool,
}

impl Default for PerceptronParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            tolerance: 1e-5,
            use_average: true,
        }
    }
}

impl PerceptronParams {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: usize) -> io::Result<()> {
        if iterations < 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "iterations must be at least 1",
            ));
        }
        self.iterations = iterations;
        Ok(())
    }

    /// Training stops once the error rate drops below this value
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f64) -> io::Result<()> {
        if tolerance < 0.0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "tolerance must be non-negative",
            ));
        }
        self.tolerance = tolerance;
        Ok(())
    }

    pub fn use_average(&self) -> bool {
        self.use_average
    }

    pub fn set_use_average(&mut self, enabled: bool) {
        self.use_average = enabled;
    }
}

impl TrainingAlgorithm for Perceptron {
    type Params = PerceptronParams;

    const ALGORITHM: Algorithm = Algorithm::Perceptron;

    fn configure(params: &mut PerceptronParams, settings: &TrainingParameters) -> io::Result<()> {
        params.set_iterations(settings.parse_or(ITERATIONS_PARAM, params.iterations)?)?;
        params.set_tolerance(settings.parse_or(TOLERANCE_PARAM, params.tolerance)?)?;
        params.set_use_average(settings.parse_or(USE_AVERAGE_PARAM, params.use_average)?);
        Ok(())
    }

    fn train(trainer: &mut Trainer<Self>, fgen: &mut FeatureGenerator) -> io::Result<()> {
        trainer.train_perceptron(fgen)
    }
}

impl Trainer<Perceptron> {
    /// Train with the averaged perceptron, one event per token
    pub(super) fn train_perceptron(&mut self, fgen: &mut FeatureGenerator) -> io::Result<()> {
        let num_features = fgen.num_features();
        let num_events: usize = self.instances.iter().map(|inst| inst.len()).sum();

        let mut weights = vec![0.0; num_features];
        let mut summed_updates = vec![0.0; num_features];
        let mut scores = vec![0.0; fgen.num_labels()];
        let mut c = 1.0; // Update counter

        for epoch in 0..self.params.iterations() {
            let mut errors = 0usize;

            for inst in &self.instances {
                for (item, &label) in inst.items.iter().zip(&inst.labels) {
                    scores.iter_mut().for_each(|s| *s = 0.0);
                    fgen.score_item(item, &weights, &mut scores);
                    let predicted = super::argmax(&scores);

                    if predicted != label {
                        for &pid in item {
                            if let Some(fid) = fgen.state_feature(pid, label) {
                                weights[fid as usize] += 1.0;
                                summed_updates[fid as usize] += c;
                            }
                            if let Some(fid) = fgen.state_feature(pid, predicted) {
                                weights[fid as usize] -= 1.0;
                                summed_updates[fid as usize] -= c;
                            }
                        }
                        errors += 1;
                    }
                    c += 1.0;
                }
            }

            let error_rate = errors as f64 / num_events as f64;
            debug!(epoch = epoch + 1, error_rate, "perceptron epoch");

            if error_rate < self.params.tolerance() {
                debug!(epoch = epoch + 1, "perceptron converged");
                break;
            }
        }

        if self.params.use_average() {
            for (w, s) in weights.iter_mut().zip(&summed_updates) {
                *w -= s / c;
            }
        }

        fgen.set_weights(&weights);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_use_average() {
        let mut params = PerceptronParams::default();
        let mut settings = TrainingParameters::new();
        settings.put(USE_AVERAGE_PARAM, "false");
        settings.put(TOLERANCE_PARAM, "0.01");
        Perceptron::configure(&mut params, &settings).unwrap();
        assert!(!params.use_average());
        assert_eq!(params.tolerance(), 0.01);
        assert_eq!(params.iterations(), 100);

        settings.put(USE_AVERAGE_PARAM, "sometimes");
        assert!(Perceptron::configure(&mut params, &settings).is_err());
    }
}
