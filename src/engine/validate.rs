//! Registry validation.
//!
//! Reconciles a parsed [`RawRuleSet`] against the live registry and groups
//! the survivors into a [`RuleStore`]:
//!
//! - a direct rule whose *source* is unknown is dropped entirely;
//! - a candidate whose *target* is unknown is dropped individually, and the
//!   rule survives as long as one candidate remains;
//! - a tag's own identity is never existence-checked — tags resolve lazily
//!   through [`crate::Registry::has_tag`] at lookup time — but its
//!   candidates are pruned exactly like direct ones.
//!
//! Every removal produces a [`Diagnostic`] naming the offending id, so a
//! user can see precisely why a rule from their file is not in effect.
//!
//! Validation requires a registry. Deferral while the registry is still
//! unavailable is the lifecycle controller's job: it keeps the raw set
//! pending and re-invokes validation on `on_registry_ready`.

use std::collections::{HashMap, HashSet};

use super::store::RuleStore;
use crate::{BiomeId, Candidate, Diagnostic, RawRuleSet, Registry, TagId};

/// Prune `raw` against `registry` and build the queryable store.
pub fn validate(raw: &RawRuleSet, registry: &dyn Registry) -> (RuleStore, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let mut direct: HashMap<BiomeId, Vec<Candidate>> = HashMap::new();
    let mut unknown_sources: HashSet<&BiomeId> = HashSet::new();
    for (source, candidate) in &raw.direct {
        if unknown_sources.contains(source) {
            continue;
        }
        if !registry.exists(source) {
            unknown_sources.insert(source);
            diagnostics.push(Diagnostic::SourceUnknown { source: source.clone() });
            continue;
        }
        if !registry.exists(&candidate.target) {
            diagnostics.push(Diagnostic::TargetUnknown {
                source: source.to_string(),
                target: candidate.target.clone(),
            });
            continue;
        }
        direct.entry(source.clone()).or_default().push(candidate.clone());
    }

    // Tags keep declaration order: first occurrence in the file decides
    // where the tag sits in the scan sequence.
    let mut tags: Vec<(TagId, Vec<Candidate>)> = Vec::new();
    for (tag, candidate) in &raw.tags {
        if !registry.exists(&candidate.target) {
            diagnostics.push(Diagnostic::TargetUnknown {
                source: format!("#{tag}"),
                target: candidate.target.clone(),
            });
            continue;
        }
        match tags.iter_mut().find(|(existing, _)| existing == tag) {
            Some((_, candidates)) => candidates.push(candidate.clone()),
            None => tags.push((tag.clone(), vec![candidate.clone()])),
        }
    }

    (RuleStore::new(direct, tags), diagnostics)
}
