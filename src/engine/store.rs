//! The validated rule snapshot.
//!
//! A [`RuleStore`] is immutable after construction. The lifecycle controller
//! replaces it wholesale with an atomic swap; nothing ever mutates one in
//! place, so a reader holding a snapshot can never observe a half-updated
//! rule set.

use std::collections::HashMap;

use crate::{BiomeId, Candidate, TagId};

/// Validated, queryable snapshot of all active rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleStore {
    direct: HashMap<BiomeId, Vec<Candidate>>,
    tags: Vec<(TagId, Vec<Candidate>)>,
}

impl RuleStore {
    pub(crate) fn new(direct: HashMap<BiomeId, Vec<Candidate>>, tags: Vec<(TagId, Vec<Candidate>)>) -> Self {
        RuleStore { direct, tags }
    }

    /// Direct candidates for `id`, in file order. Empty slice if there is no
    /// direct rule for this biome.
    pub fn direct(&self, id: &BiomeId) -> &[Candidate] {
        self.direct.get(id).map_or(&[], Vec::as_slice)
    }

    /// Tag rules in declaration order.
    pub fn tags(&self) -> impl Iterator<Item = (&TagId, &[Candidate])> {
        self.tags.iter().map(|(tag, candidates)| (tag, candidates.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.tags.is_empty()
    }

    /// Number of biomes with at least one direct rule.
    pub fn direct_len(&self) -> usize {
        self.direct.len()
    }

    /// Number of tags with at least one rule.
    pub fn tag_len(&self) -> usize {
        self.tags.len()
    }
}
