use std::collections::{BTreeSet, HashMap};
use std::io;

use super::dataset::Instance;
use crate::feature::{Feature, FeatureType};

/// Feature set of a training run
pub struct FeatureGenerator {
    /// All features, state features first
    pub features: Vec<Feature>,
    /// State feature IDs by predicate ID; empty for predicates below the cutoff
    pub pred_refs: Vec<Vec<u32>>,
    /// Feature ID of each (src, dst, type) triple
    index: HashMap<(FeatureType, u32, u32), u32>,
    num_labels: usize,
}

impl FeatureGenerator {
    /// Generate features from training instances.
    ///
    /// A predicate is kept when it occurs at least `cutoff` times; it yields
    /// one state feature per tag it was observed with. With `transitions`
    /// every observed (previous tag, tag) pair becomes a transition feature.
    pub fn generate(
        instances: &[Instance],
        num_preds: usize,
        num_labels: usize,
        cutoff: usize,
        transitions: bool,
    ) -> io::Result<Self> {
        let mut pred_counts = vec![0usize; num_preds];
        for inst in instances {
            for item in &inst.items {
                for &pid in item {
                    pred_counts[pid as usize] += 1;
                }
            }
        }

        let mut state_pairs = BTreeSet::new();
        let mut trans_pairs = BTreeSet::new();
        for inst in instances {
            for (t, item) in inst.items.iter().enumerate() {
                let label = inst.labels[t];
                for &pid in item {
                    if pred_counts[pid as usize] >= cutoff {
                        state_pairs.insert((pid, label));
                    }
                }
                if transitions && t > 0 {
                    trans_pairs.insert((inst.labels[t - 1], label));
                }
            }
        }

        let mut features = Vec::with_capacity(state_pairs.len() + trans_pairs.len());
        let mut pred_refs = vec![Vec::new(); num_preds];
        let mut index = HashMap::new();

        let pairs = state_pairs
            .into_iter()
            .map(|pair| (FeatureType::State, pair))
            .chain(
                trans_pairs
                    .into_iter()
                    .map(|pair| (FeatureType::Transition, pair)),
            );
        for (ftype, (src, dst)) in pairs {
            let fid = u32::try_from(features.len())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "too many features"))?;
            features.push(Feature {
                ftype,
                src,
                dst,
                weight: 0.0,
            });
            if ftype == FeatureType::State {
                pred_refs[src as usize].push(fid);
            }
            index.insert((ftype, src, dst), fid);
        }

        Ok(Self {
            features,
            pred_refs,
            index,
            num_labels,
        })
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Number of predicates of `item` that survived the cutoff
    pub fn num_active(&self, item: &[u32]) -> usize {
        item.iter()
            .filter(|&&pid| !self.pred_refs[pid as usize].is_empty())
            .count()
    }

    pub fn state_feature(&self, pid: u32, label: u32) -> Option<u32> {
        self.index.get(&(FeatureType::State, pid, label)).copied()
    }

    pub fn transition_feature(&self, prev: u32, label: u32) -> Option<u32> {
        self.index
            .get(&(FeatureType::Transition, prev, label))
            .copied()
    }

    /// Add the state scores of `item` under `weights` to `scores` (one per tag)
    pub fn score_item(&self, item: &[u32], weights: &[f64], scores: &mut [f64]) {
        for &pid in item {
            for &fid in &self.pred_refs[pid as usize] {
                let feature = &self.features[fid as usize];
                scores[feature.dst as usize] += weights[fid as usize];
            }
        }
    }

    /// `[L][L]` transition score matrix under `weights`
    pub fn transition_matrix(&self, weights: &[f64]) -> Vec<f64> {
        let l = self.num_labels;
        let mut trans = vec![0.0; l * l];
        for (fid, feature) in self.features.iter().enumerate() {
            if feature.ftype == FeatureType::Transition {
                trans[feature.src as usize * l + feature.dst as usize] = weights[fid];
            }
        }
        trans
    }

    /// Update feature weights from a weight vector
    ///
    /// # Panics
    ///
    /// Panics if `weights.len()` does not equal `self.num_features()`.
    pub fn set_weights(&mut self, weights: &[f64]) {
        assert_eq!(
            weights.len(),
            self.features.len(),
            "weights length ({}) must equal number of features ({})",
            weights.len(),
            self.features.len()
        );
        for (feature, &weight) in self.features.iter_mut().zip(weights) {
            feature.weight = weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instances() -> Vec<Instance> {
        // predicates: 0 = "default", 1 = "w=the", 2 = "w=dog", 3 = "w=rare"
        let mut first = Instance::with_capacity(2);
        first.push(vec![0, 1], 0);
        first.push(vec![0, 2], 1);
        let mut second = Instance::with_capacity(2);
        second.push(vec![0, 1], 0);
        second.push(vec![0, 3], 1);
        vec![first, second]
    }

    #[test]
    fn test_feature_generation() {
        let fgen = FeatureGenerator::generate(&instances(), 4, 2, 0, true).unwrap();
        // state: (0,0) (0,1) (1,0) (2,1) (3,1); transition: (0,1)
        assert_eq!(fgen.num_features(), 6);
        assert!(fgen.state_feature(0, 1).is_some());
        assert!(fgen.state_feature(1, 1).is_none());
        assert!(fgen.transition_feature(0, 1).is_some());
        assert!(fgen.transition_feature(1, 0).is_none());
        assert_eq!(
            fgen.features.last().map(|f| f.ftype),
            Some(FeatureType::Transition)
        );
    }

    #[test]
    fn test_cutoff_drops_rare_predicates() {
        let fgen = FeatureGenerator::generate(&instances(), 4, 2, 2, false).unwrap();
        assert!(fgen.pred_refs[2].is_empty());
        assert!(fgen.pred_refs[3].is_empty());
        assert_eq!(fgen.pred_refs[0].len(), 2);
        assert_eq!(fgen.num_active(&[0, 1, 3]), 2);
        assert!(fgen
            .features
            .iter()
            .all(|f| f.ftype == FeatureType::State));
    }

    #[test]
    fn test_scoring() {
        let mut fgen = FeatureGenerator::generate(&instances(), 4, 2, 0, true).unwrap();
        let mut weights = vec![0.0; fgen.num_features()];
        weights[fgen.state_feature(1, 0).unwrap() as usize] = 2.0;
        weights[fgen.transition_feature(0, 1).unwrap() as usize] = 0.5;

        let mut scores = vec![0.0; 2];
        fgen.score_item(&[0, 1], &weights, &mut scores);
        assert_eq!(scores, [2.0, 0.0]);
        assert_eq!(fgen.transition_matrix(&weights), [0.0, 0.5, 0.0, 0.0]);

        fgen.set_weights(&weights);
        assert_eq!(fgen.features[fgen.state_feature(1, 0).unwrap() as usize].weight, 2.0);
    }
}
