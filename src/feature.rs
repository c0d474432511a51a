/// Feature type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureType {
    /// State feature: (predicate, tag) -> weight
    State = 0,
    /// Transition feature: (previous tag, tag) -> weight
    Transition = 1,
}

impl FeatureType {
    pub(crate) fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(FeatureType::State),
            1 => Some(FeatureType::Transition),
            _ => None,
        }
    }
}

/// A weighted feature
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub ftype: FeatureType,
    /// Predicate ID for state features, previous tag ID for transitions
    pub src: u32,
    /// Tag ID
    pub dst: u32,
    pub weight: f64,
}
