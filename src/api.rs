//! Public surface.
//!
//! [`Replacer`] bundles the engine's lifecycle controller with the rules
//! file I/O so a host only needs three calls: load, prepare, resolve. Hosts
//! that manage their own file handling can use [`parse_rules`] and the
//! line-based methods instead.

use std::path::Path;

use crate::config::{self, ConfigError};
use crate::engine::{self, Controller};
use crate::{BiomeId, Diagnostic, RawRuleSet, Registry, RuleOptions};

pub use crate::engine::Context;

/// The replacement engine: owns the rule store and its lifecycle.
///
/// All methods take `&self` and are safe to call from concurrent threads;
/// a reload is an atomic snapshot swap that in-flight lookups never observe
/// partially.
pub struct Replacer {
    controller: Controller,
}

impl Replacer {
    pub fn new() -> Self {
        Replacer { controller: Controller::new() }
    }

    /// Parse rules from in-memory lines. No I/O, no validation yet.
    pub fn load_lines<I>(&self, lines: I) -> Vec<Diagnostic>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.controller.load(lines)
    }

    /// Read and parse the rules file, creating the commented default file
    /// first when absent. On I/O failure the previously installed rules (if
    /// any) stay in effect.
    pub fn load_file(&self, path: &Path) -> Result<Vec<Diagnostic>, ConfigError> {
        config::create_if_absent(path)?;
        let lines = config::read_lines(path)?;
        Ok(self.controller.load(lines))
    }

    /// Validate loaded rules against `registry` and install them, exactly
    /// once. Safe to call repeatedly and concurrently.
    pub fn prepare_if_needed(&self, registry: &dyn Registry) -> Vec<Diagnostic> {
        self.controller.prepare_if_needed(registry)
    }

    /// Host signal that a (new) registry epoch is available; re-validates
    /// the retained rules against it.
    pub fn on_registry_ready(&self, registry: &dyn Registry) -> Vec<Diagnostic> {
        self.controller.on_registry_ready(registry)
    }

    /// Re-read the rules file and install the result as one atomic swap.
    /// On I/O failure the previous rule store is kept.
    pub fn force_reload_file(
        &self,
        path: &Path,
        registry: &dyn Registry,
    ) -> Result<Vec<Diagnostic>, ConfigError> {
        let lines = config::read_lines(path)?;
        Ok(self.controller.force_reload(lines, registry))
    }

    /// Reload from in-memory lines and install as one atomic swap.
    pub fn force_reload_lines<I>(&self, lines: I, registry: &dyn Registry) -> Vec<Diagnostic>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.controller.force_reload(lines, registry)
    }

    /// The lookup interception point: map `id` to its replacement, or hand
    /// it back unchanged. Never fails; before the engine is ready this is a
    /// pass-through.
    pub fn resolve(&self, registry: &dyn Registry, id: &BiomeId, ctx: &Context) -> BiomeId {
        self.controller.resolve(registry, id, ctx)
    }

    /// True when resolution would not replace anything.
    pub fn no_replacements(&self) -> bool {
        self.controller.no_replacements()
    }

    /// True once rules have been validated and installed.
    pub fn is_ready(&self) -> bool {
        self.controller.is_ready()
    }

    /// Options parsed from the most recent load.
    pub fn options(&self) -> RuleOptions {
        self.controller.options()
    }

    /// `(direct rules, tag rules)` counts of the installed store, for
    /// startup summaries.
    pub fn rule_counts(&self) -> (usize, usize) {
        let store = self.controller.snapshot();
        (store.direct_len(), store.tag_len())
    }
}

impl Default for Replacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse rule lines without touching an engine instance. Pure; useful for
/// linting a file or for tests.
///
/// # Example
/// ```
/// use biomeshift::parse_rules;
///
/// let (raw, diagnostics) = parse_rules(["minecraft:dark_forest > minecraft:cherry_grove"]);
/// assert_eq!(raw.direct.len(), 1);
/// assert!(diagnostics.is_empty());
/// ```
pub fn parse_rules<I>(lines: I) -> (RawRuleSet, Vec<Diagnostic>)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    engine::parse(lines)
}
