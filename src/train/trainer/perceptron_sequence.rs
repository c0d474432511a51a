use std::io;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::super::feature_gen::FeatureGenerator;
use super::{PerceptronSequence, Trainer, TrainingAlgorithm};
use crate::lattice::Lattice;
use crate::params::{
    Algorithm, TrainingParameters, ITERATIONS_PARAM, SEED_PARAM, TOLERANCE_PARAM,
    USE_AVERAGE_PARAM,
};

/// Structured perceptron training parameters.
#[derive(Debug, Clone)]
pub struct PerceptronSequenceParams {
    iterations: usize,
    tolerance: f64,
    use_average: bool,
    seed: Option<u64>,
}

impl Default for PerceptronSequenceParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            tolerance: 1e-5,
            use_average: true,
            seed: None,
        }
    }
}

impl PerceptronSequenceParams {
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

    /// Shuffle seed, entropy-seeded when `None`
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.seed = seed;
    }
}

impl TrainingAlgorithm for PerceptronSequence {
    type Params = PerceptronSequenceParams;

    const ALGORITHM: Algorithm = Algorithm::PerceptronSequence;

    fn configure(
        params: &mut PerceptronSequenceParams,
        settings: &TrainingParameters,
    ) -> io::Result<()> {
        params.set_iterations(settings.parse_or(ITERATIONS_PARAM, params.iterations)?)?;
        params.set_tolerance(settings.parse_or(TOLERANCE_PARAM, params.tolerance)?)?;
        params.set_use_average(settings.parse_or(USE_AVERAGE_PARAM, params.use_average)?);
        if settings.get(SEED_PARAM).is_some() {
            params.set_seed(Some(settings.parse_or(SEED_PARAM, 0u64)?));
        }
        Ok(())
    }

    fn train(trainer: &mut Trainer<Self>, fgen: &mut FeatureGenerator) -> io::Result<()> {
        trainer.train_perceptron_sequence(fgen)
    }
}

impl Trainer<PerceptronSequence> {
    /// Train with the averaged structured perceptron
    pub(super) fn train_perceptron_sequence(
        &mut self,
        fgen: &mut FeatureGenerator,
    ) -> io::Result<()> {
        let num_features = fgen.num_features();
        let num_labels = fgen.num_labels();
        let num_instances = self.instances.len() as f64;
        let max_items = self
            .instances
            .iter()
            .map(|inst| inst.len())
            .max()
            .unwrap_or(0);

        // Transition feature of each (prev, label) cell
        let trans_ids: Vec<Option<u32>> = (0..num_labels * num_labels)
            .map(|k| fgen.transition_feature((k / num_labels) as u32, (k % num_labels) as u32))
            .collect();

        let mut weights = vec![0.0; num_features];
        let mut summed_updates = vec![0.0; num_features];
        let mut trans = vec![0.0; num_labels * num_labels];
        let mut c = 1.0; // Update counter

        let mut lattice = Lattice::new(num_labels, max_items);
        let mut order: Vec<usize> = (0..self.instances.len()).collect();
        let mut rng = match self.params.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        for epoch in 0..self.params.iterations() {
            let mut loss = 0.0;

            if order.len() > 1 {
                super::shuffle_indices(&mut order, &mut rng);
            }

            for &idx in &order {
                let inst = &self.instances[idx];
                let n = inst.len();

                for (cell, fid) in trans.iter_mut().zip(&trans_ids) {
                    *cell = fid.map_or(0.0, |fid| weights[fid as usize]);
                }
                lattice.reset(n);
                for (t, item) in inst.items.iter().enumerate() {
                    fgen.score_item(item, &weights, lattice.row_mut(t));
                }
                let predicted = lattice.viterbi(&trans);

                let num_diff = predicted
                    .iter()
                    .zip(&inst.labels)
                    .filter(|(p, l)| p != l)
                    .count();
                if num_diff > 0 {
                    let mut update = |fid: Option<u32>, delta: f64| {
                        if let Some(fid) = fid {
                            weights[fid as usize] += delta;
                            summed_updates[fid as usize] += c * delta;
                        }
                    };
                    for t in 0..n {
                        let (gold, pred) = (inst.labels[t], predicted[t]);
                        if gold != pred {
                            for &pid in &inst.items[t] {
                                update(fgen.state_feature(pid, gold), 1.0);
                                update(fgen.state_feature(pid, pred), -1.0);
                            }
                        }
                        if t > 0 {
                            let gold_prev = inst.labels[t - 1];
                            let pred_prev = predicted[t - 1];
                            if (gold_prev, gold) != (pred_prev, pred) {
                                let l = num_labels;
                                update(trans_ids[gold_prev as usize * l + gold as usize], 1.0);
                                update(trans_ids[pred_prev as usize * l + pred as usize], -1.0);
                            }
                        }
                    }
                    loss += num_diff as f64 / n as f64;
                }
                c += 1.0;
            }

            let error_rate = loss / num_instances;
            debug!(epoch = epoch + 1, error_rate, "sequence perceptron epoch");

            if error_rate < self.params.tolerance() {
                debug!(epoch = epoch + 1, "sequence perceptron converged");
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
