use crate::lattice::Lattice;
use crate::model::PosModel;
use crate::tag_dictionary::TagDictionary;
use crate::train::ContextGenerator;

/// The tagger predicts the tag sequence of a sentence using a model
#[derive(Debug, Clone)]
pub struct Tagger<'a> {
    model: &'a PosModel,
    contexts: ContextGenerator<'a>,
    /// `[L][L]` transition scores, sequence models only
    trans: Vec<f64>,
}

impl<'a> Tagger<'a> {
    pub(crate) fn new(model: &'a PosModel) -> Self {
        let trans = if model.algorithm().is_sequence() {
            model.transition_matrix()
        } else {
            Vec::new()
        };
        Self {
            model,
            contexts: ContextGenerator::new(model.ngram_dictionary()),
            trans,
        }
    }

    /// Predict the tag sequence of `words`.
    ///
    /// Event models decode greedily left to right, feeding back the tags
    /// assigned so far; the sequence model runs Viterbi.
    pub fn tag<S: AsRef<str>>(&self, words: &[S]) -> Vec<&'a str> {
        if words.is_empty() || self.model.num_tags() == 0 {
            return Vec::new();
        }
        let ids = if self.model.algorithm().is_sequence() {
            self.tag_sequence(words)
        } else {
            self.tag_greedy(words)
        };
        ids.into_iter()
            .map(|id| self.model.tag(id).unwrap_or_default())
            .collect()
    }

    fn tag_greedy<S: AsRef<str>>(&self, words: &[S]) -> Vec<u32> {
        let mut scores = vec![0.0; self.model.num_tags()];
        let mut tags: Vec<&str> = Vec::with_capacity(words.len());
        let mut ids = Vec::with_capacity(words.len());
        for index in 0..words.len() {
            let preds = self.contexts.context(words, index, Some(tags.as_slice()));
            self.state_scores(&preds, &mut scores);
            self.restrict(words[index].as_ref(), &mut scores);

            let id = argmax(&scores);
            tags.push(self.model.tag(id).unwrap_or_default());
            ids.push(id);
        }
        ids
    }

    fn tag_sequence<S: AsRef<str>>(&self, words: &[S]) -> Vec<u32> {
        let mut lattice = Lattice::new(self.model.num_tags(), words.len());
        for index in 0..words.len() {
            let preds = self.contexts.context(words, index, None::<&[&str]>);
            let row = lattice.row_mut(index);
            self.state_scores(&preds, row);
            self.restrict(words[index].as_ref(), row);
        }
        lattice.viterbi(&self.trans)
    }

    fn state_scores(&self, preds: &[String], scores: &mut [f64]) {
        scores.iter_mut().for_each(|s| *s = 0.0);
        for pred in preds {
            if let Some(pid) = self.model.predicate_id(pred) {
                for feature in self.model.state_features(pid) {
                    scores[feature.dst as usize] += feature.weight;
                }
            }
        }
    }

    /// Rule out tags the tag dictionary does not allow for `word`.
    ///
    /// Entries naming no tag the model knows are ignored.
    fn restrict(&self, word: &str, scores: &mut [f64]) {
        let allowed = match self
            .model
            .tag_dictionary()
            .and_then(|dict| dict.tags(word))
        {
            Some(tags) => tags,
            None => return,
        };
        let mut mask = vec![false; scores.len()];
        for tag in allowed {
            if let Some(id) = self.model.tag_id(tag) {
                mask[id as usize] = true;
            }
        }
        if !mask.contains(&true) {
            return;
        }
        for (score, &ok) in scores.iter_mut().zip(&mask) {
            if !ok {
                *score = f64::NEG_INFINITY;
            }
        }
    }
}

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
