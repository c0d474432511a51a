/// Score lattice of a sentence: `[T][L]` state scores, row-major
#[derive(Debug, Clone)]
pub(crate) struct Lattice {
    num_labels: usize,
    num_items: usize,
    pub state: Vec<f64>,
}

impl Lattice {
    pub fn new(num_labels: usize, num_items: usize) -> Self {
        Self {
            num_labels,
            num_items,
            state: vec![0.0; num_labels * num_items],
        }
    }

    /// Clear the scores and resize for a sentence of `num_items` tokens
    pub fn reset(&mut self, num_items: usize) {
        self.num_items = num_items;
        self.state.clear();
        self.state.resize(self.num_labels * num_items, 0.0);
    }

    pub fn row_mut(&mut self, t: usize) -> &mut [f64] {
        let l = self.num_labels;
        &mut self.state[l * t..l * (t + 1)]
    }

    /// Best label sequence given the `[L][L]` transition matrix
    /// (`trans[i * L + j]` scores label `i` followed by label `j`).
    pub fn viterbi(&self, trans: &[f64]) -> Vec<u32> {
        let l = self.num_labels;
        let n = self.num_items;
        if n == 0 || l == 0 {
            return Vec::new();
        }

        let mut score = self.state[..l].to_vec();
        let mut back = vec![0u32; n * l];
        let mut next = vec![0.0; l];

        for t in 1..n {
            let state = &self.state[l * t..l * (t + 1)];
            for j in 0..l {
                let mut best = f64::NEG_INFINITY;
                let mut argmax = 0;
                for i in 0..l {
                    let s = score[i] + trans[i * l + j];
                    if s > best {
                        best = s;
                        argmax = i;
                    }
                }
                next[j] = best + state[j];
                back[t * l + j] = argmax as u32;
            }
            std::mem::swap(&mut score, &mut next);
        }

        let mut best = f64::NEG_INFINITY;
        let mut label = 0usize;
        for (j, &s) in score.iter().enumerate() {
            if s > best {
                best = s;
                label = j;
            }
        }

        let mut labels = vec![0u32; n];
        labels[n - 1] = label as u32;
        for t in (1..n).rev() {
            labels[t - 1] = back[t * l + labels[t] as usize];
        }
        labels
    }
}
