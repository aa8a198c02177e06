//! Engine lifecycle.
//!
//! State machine: `Uninitialized → (load) → Loaded → (validate) → Ready`.
//!
//! The controller owns the only mutable state in the crate:
//!
//! - the installed [`RuleStore`], behind an `ArcSwap` so a reload is a
//!   single pointer swap — concurrent lookups see either the old snapshot
//!   or the new one, never a mixture;
//! - the pending raw rule set, kept after parsing so validation can run
//!   (and re-run) whenever a registry epoch arrives;
//! - the `prepared` flag, advanced with a compare-and-set so exactly one
//!   of several concurrent first callers performs the load-and-validate
//!   sequence.
//!
//! Lifecycle transitions are explicit methods the host calls
//! (`prepare_if_needed`, `on_registry_ready`, `force_reload`); the engine
//! subscribes to no event bus. Before `Ready`, [`Controller::resolve`] is a
//! pass-through.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;

use super::resolve::Context;
use super::store::RuleStore;
use super::{parser, resolve, validate};
use crate::{BiomeId, Diagnostic, RawRuleSet, Registry, RuleOptions};

/// Coordinates parsing, validation, and the atomic store swap.
pub struct Controller {
    store: ArcSwap<RuleStore>,
    pending: Mutex<Option<RawRuleSet>>,
    options: Mutex<RuleOptions>,
    prepared: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Controller {
    pub fn new() -> Self {
        Controller {
            store: ArcSwap::from_pointee(RuleStore::default()),
            pending: Mutex::new(None),
            options: Mutex::new(RuleOptions::default()),
            prepared: AtomicBool::new(false),
        }
    }

    /// Parse `lines` into the pending slot. The installed store is left
    /// untouched; call [`Controller::prepare_if_needed`] or
    /// [`Controller::force_reload`] to validate and install.
    pub fn load<I>(&self, lines: I) -> Vec<Diagnostic>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let (raw, diagnostics) = parser::parse(lines);
        for diagnostic in &diagnostics {
            log::warn!("{diagnostic}");
        }
        *lock(&self.options) = raw.options;
        *lock(&self.pending) = Some(raw);
        diagnostics
    }

    /// One-time preparation: validate the pending rules against `registry`
    /// and install the store. Exactly one of any number of concurrent first
    /// callers runs the sequence; every later call is a no-op.
    pub fn prepare_if_needed(&self, registry: &dyn Registry) -> Vec<Diagnostic> {
        if self
            .prepared
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Vec::new();
        }
        self.install(registry)
    }

    /// Host signal that a (new) registry epoch is available. Re-validates
    /// the retained raw rules against it and swaps the store.
    pub fn on_registry_ready(&self, registry: &dyn Registry) -> Vec<Diagnostic> {
        self.prepared.store(true, Ordering::Release);
        self.install(registry)
    }

    /// Reload from fresh lines: parse, validate, and install as one atomic
    /// swap. Loading the same lines twice installs an identical store.
    pub fn force_reload<I>(&self, lines: I, registry: &dyn Registry) -> Vec<Diagnostic>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut diagnostics = self.load(lines);
        self.prepared.store(true, Ordering::Release);
        diagnostics.extend(self.install(registry));
        diagnostics
    }

    fn install(&self, registry: &dyn Registry) -> Vec<Diagnostic> {
        let raw = lock(&self.pending).clone();
        let Some(raw) = raw else {
            log::debug!("no rules loaded yet, nothing to validate");
            return Vec::new();
        };
        let (store, diagnostics) = validate::validate(&raw, registry);
        for diagnostic in &diagnostics {
            log::warn!("{diagnostic}");
        }
        log::info!(
            "installed {} direct rule(s) and {} tag rule(s)",
            store.direct_len(),
            store.tag_len()
        );
        self.store.store(Arc::new(store));
        diagnostics
    }

    /// Resolve a lookup. Never fails; before `Ready` this is a pass-through.
    pub fn resolve(&self, registry: &dyn Registry, id: &BiomeId, ctx: &Context) -> BiomeId {
        if !self.prepared.load(Ordering::Acquire) {
            return id.clone();
        }
        let store = self.store.load();
        resolve::resolve(&store, registry, id, ctx)
    }

    /// True when resolution would not replace anything: not yet `Ready`, or
    /// the installed store has no rules.
    pub fn no_replacements(&self) -> bool {
        !self.prepared.load(Ordering::Acquire) || self.store.load().is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.prepared.load(Ordering::Acquire)
    }

    /// Options parsed from the most recent load.
    pub fn options(&self) -> RuleOptions {
        *lock(&self.options)
    }

    /// The currently installed snapshot.
    pub fn snapshot(&self) -> Arc<RuleStore> {
        self.store.load_full()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}
