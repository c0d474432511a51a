/// Predicate IDs active at one token
pub type Item = Vec<u32>;

/// A training sentence: one item and one tag ID per token
#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub items: Vec<Item>,
    pub labels: Vec<u32>,
}

impl Instance {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
            labels: Vec::with_capacity(cap),
        }
    }

    pub fn push(&mut self, item: Item, label: u32) {
        self.items.push(item);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
