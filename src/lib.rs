extern crate self as biomeshift;

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;

pub use api::{Context, Replacer, parse_rules};
pub use config::{ConfigError, DEFAULT_FILE_NAME, create_if_absent, read_lines};
pub use engine::RuleStore;

use std::collections::{HashMap, HashSet};
use std::fmt;

// --- Core types ---------------------------------------------------------

/// Namespaced identifier naming one concrete biome, e.g. `minecraft:dark_forest`.
///
/// Equality is exact string equality. Whether the biome actually exists is
/// only knowable through a [`Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(Box<str>);

/// Named set of biomes (a "tag"), e.g. `minecraft:is_forest`. Membership is
/// resolved externally by the [`Registry`], never by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagId(Box<str>);

impl BiomeId {
    /// Parse a biome id, accepting `namespace:path` or a bare `path` which
    /// is normalized to the `minecraft:` namespace.
    pub fn parse(raw: &str) -> Option<BiomeId> {
        parse_location(raw).map(BiomeId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TagId {
    /// Parse a tag id. Same token syntax as [`BiomeId::parse`], without the
    /// leading `#` marker (the config parser strips that).
    pub fn parse(raw: &str) -> Option<TagId> {
        parse_location(raw).map(TagId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate and normalize a `namespace:path` token.
///
/// The accepted charset matches what the host's resource-location parser
/// accepts: lowercase alphanumerics plus `_ . -` in the namespace and
/// additionally `/` in the path. A token with no `:` gets the `minecraft:`
/// namespace.
fn parse_location(raw: &str) -> Option<Box<str>> {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((namespace, path)) => {
            if regex!(r"^[a-z0-9_.-]+$").is_match(namespace) && regex!(r"^[a-z0-9_./-]+$").is_match(path) {
                Some(raw.into())
            } else {
                None
            }
        }
        None => {
            if regex!(r"^[a-z0-9_./-]+$").is_match(raw) {
                Some(format!("minecraft:{raw}").into_boxed_str())
            } else {
                None
            }
        }
    }
}

/// How a replacement candidate decides whether it fires for a given lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPolicy {
    /// Fires unconditionally.
    Always,
    /// Independent roll in `[0, 1)` against `p`, fresh process randomness.
    Probability(f64),
    /// Probability roll drawn from a generator derived from
    /// `(world seed, source id)`, so the same pair always resolves the same
    /// way across runs and restarts.
    SeedDeterministic(f64),
    /// Spatial gate: fires only within this distance of the center of the
    /// lookup position's chunk. A radius of zero or less disables the gate.
    BlendRadius(f64),
}

/// A possible replacement target plus its selection policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub target: BiomeId,
    pub policy: SelectionPolicy,
}

/// Global options recognized on `key = value` config lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOptions {
    /// Suppress the host's join-chat notification. The engine only parses
    /// and exposes this; it never prints chat itself.
    pub mute_chat_info: bool,
}

/// Parser output before registry validation: rules in file order, ungrouped.
///
/// Grouping (and pruning) happens in `engine::validate`; keeping the raw set
/// flat preserves everything order-sensitive about the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRuleSet {
    /// Direct rules in file order. The same source may appear several times.
    pub direct: Vec<(BiomeId, Candidate)>,
    /// Tag rules in file order.
    pub tags: Vec<(TagId, Candidate)>,
    pub options: RuleOptions,
}

/// A recoverable problem found while parsing or validating rules.
///
/// Diagnostics are never fatal: the offending line, rule, or candidate is
/// dropped and processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A config line that could not be understood and was skipped.
    MalformedLine { line: usize, text: String, why: String },
    /// A rule modifier that was not recognized; the rule itself was kept.
    UnknownModifier { line: usize, modifier: String },
    /// A direct rule whose source biome is not in the registry.
    SourceUnknown { source: BiomeId },
    /// A candidate whose target biome is not in the registry.
    TargetUnknown { source: String, target: BiomeId },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedLine { line, text, why } => {
                write!(f, "line {line}: skipped '{text}': {why}")
            }
            Diagnostic::UnknownModifier { line, modifier } => {
                write!(f, "line {line}: ignored unknown modifier '{modifier}'")
            }
            Diagnostic::SourceUnknown { source } => {
                write!(f, "rule for '{source}' removed: source biome not in registry")
            }
            Diagnostic::TargetUnknown { source, target } => {
                write!(f, "candidate '{target}' of rule '{source}' removed: target biome not in registry")
            }
        }
    }
}

// --- Registry ------------------------------------------------------------

/// External authority on which biomes currently exist and which tags they
/// carry. The engine never mutates a registry and holds no reference to one
/// between calls; every operation that needs it takes it as a parameter.
pub trait Registry {
    fn exists(&self, id: &BiomeId) -> bool;
    fn has_tag(&self, id: &BiomeId, tag: &TagId) -> bool;
}

/// In-memory registry snapshot, for hosts with a static biome list and for
/// tests.
#[derive(Debug, Default, Clone)]
pub struct FixedRegistry {
    ids: HashSet<BiomeId>,
    tags: HashMap<TagId, HashSet<BiomeId>>,
}

impl FixedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from id tokens; tokens that fail to parse are
    /// silently skipped.
    pub fn with_ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut registry = Self::new();
        for raw in ids {
            if let Some(id) = BiomeId::parse(raw.as_ref()) {
                registry.insert(id);
            }
        }
        registry
    }

    pub fn insert(&mut self, id: BiomeId) {
        self.ids.insert(id);
    }

    /// Record `member` as belonging to `tag`. The member is also inserted
    /// as an existing biome.
    pub fn insert_tag_member(&mut self, tag: TagId, member: BiomeId) {
        self.ids.insert(member.clone());
        self.tags.entry(tag).or_default().insert(member);
    }
}

impl Registry for FixedRegistry {
    fn exists(&self, id: &BiomeId) -> bool {
        self.ids.contains(id)
    }

    fn has_tag(&self, id: &BiomeId, tag: &TagId) -> bool {
        self.tags.get(tag).is_some_and(|members| members.contains(id))
    }
}
