use std::io;

use tracing::debug;

use super::super::feature_gen::FeatureGenerator;
use super::{Maxent, Trainer, TrainingAlgorithm};
use crate::params::{Algorithm, TrainingParameters, ITERATIONS_PARAM, TOLERANCE_PARAM};

/// Maximum entropy (GIS) training parameters.
#[derive(Debug, Clone)]
pub struct MaxentParams {
    iterations: usize,
    tolerance: f64,
}

impl Default for MaxentParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            tolerance: 1e-4,
        }
    }
}

impl MaxentParams {
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

    /// Minimum log-likelihood gain per iteration
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
}

impl TrainingAlgorithm for Maxent {
    type Params = MaxentParams;

    const ALGORITHM: Algorithm = Algorithm::Maxent;

    fn configure(params: &mut MaxentParams, settings: &TrainingParameters) -> io::Result<()> {
        params.set_iterations(settings.parse_or(ITERATIONS_PARAM, params.iterations)?)?;
        params.set_tolerance(settings.parse_or(TOLERANCE_PARAM, params.tolerance)?)
    }

    fn train(trainer: &mut Trainer<Self>, fgen: &mut FeatureGenerator) -> io::Result<()> {
        trainer.train_maxent(fgen)
    }
}

impl Trainer<Maxent> {
    /// Train with generalized iterative scaling
    pub(super) fn train_maxent(&mut self, fgen: &mut FeatureGenerator) -> io::Result<()> {
        let num_features = fgen.num_features();
        let num_labels = fgen.num_labels();

        // GIS correction constant: the largest number of active predicates
        let correction = self
            .instances
            .iter()
            .flat_map(|inst| inst.items.iter())
            .map(|item| fgen.num_active(item))
            .max()
            .unwrap_or(0)
            .max(1) as f64;

        let mut observed = vec![0.0; num_features];
        let mut num_events = 0usize;
        for inst in &self.instances {
            for (item, &label) in inst.items.iter().zip(&inst.labels) {
                for &pid in item {
                    if let Some(fid) = fgen.state_feature(pid, label) {
                        observed[fid as usize] += 1.0;
                    }
                }
                num_events += 1;
            }
        }

        let mut weights = vec![0.0; num_features];
        let mut expected = vec![0.0; num_features];
        let mut scores = vec![0.0; num_labels];
        let mut prev_loglik = f64::NEG_INFINITY;

        for iteration in 0..self.params.iterations() {
            expected.iter_mut().for_each(|e| *e = 0.0);
            let mut loglik = 0.0;
            let mut correct = 0usize;

            for inst in &self.instances {
                for (item, &label) in inst.items.iter().zip(&inst.labels) {
                    scores.iter_mut().for_each(|s| *s = 0.0);
                    fgen.score_item(item, &weights, &mut scores);

                    let best = super::argmax(&scores);
                    if best == label {
                        correct += 1;
                    }

                    // Softmax in place
                    let max = scores[best as usize];
                    let mut sum = 0.0;
                    for s in scores.iter_mut() {
                        *s = (*s - max).exp();
                        sum += *s;
                    }
                    for s in scores.iter_mut() {
                        *s /= sum;
                    }
                    loglik += scores[label as usize].ln();

                    for &pid in item {
                        for &fid in &fgen.pred_refs[pid as usize] {
                            let dst = fgen.features[fid as usize].dst;
                            expected[fid as usize] += scores[dst as usize];
                        }
                    }
                }
            }

            for ((w, &obs), &exp) in weights.iter_mut().zip(&observed).zip(&expected) {
                if obs > 0.0 && exp > 0.0 {
                    *w += (obs / exp).ln() / correction;
                }
            }

            debug!(
                iteration = iteration + 1,
                loglikelihood = loglik,
                accuracy = correct as f64 / num_events as f64,
                "maxent iteration"
            );

            if (loglik - prev_loglik).abs() < self.params.tolerance() {
                debug!(iteration = iteration + 1, "maxent converged");
                break;
            }
            prev_loglik = loglik;
        }

        fgen.set_weights(&weights);
        Ok(())
    }
}
