//! Rule engine: parsing, validation, storage, resolution, lifecycle.
//!
//! This module is the core of the crate. Everything here is synchronous and
//! registry-agnostic: the host supplies a [`crate::Registry`] at the call
//! sites that need one and triggers lifecycle transitions explicitly.
//!
//! ## How the parts work together
//!
//! ```text
//! config lines ── parse ────────────────► RawRuleSet + diagnostics
//!                 (parser.rs)                  │
//!                                              │
//! registry ────── validate ────────────────────┼─► RuleStore + diagnostics
//!                 (validate.rs)                │       │
//!                                              │       │ atomic swap
//!                 Controller ◄─────────────────┘       │ (arc-swap)
//!                 (lifecycle.rs)                       ▼
//!                                              installed snapshot
//!                                                      │
//! lookup ──────── resolve ─────────────────────────────┴─► BiomeId
//!                 (resolve.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `parser.rs`: pure text-to-rules parsing; malformed lines become
//!   diagnostics, never errors.
//! - `validate.rs`: prunes rules whose ids the registry does not know,
//!   grouping survivors into a [`RuleStore`].
//! - `store.rs`: the immutable, queryable snapshot the resolver reads.
//! - `resolve.rs`: the per-lookup decision algorithm and selection-policy
//!   rolls. Infallible by construction.
//! - `lifecycle.rs`: one-time preparation, idempotent reload, and the
//!   atomic store swap that keeps concurrent lookups consistent.
//!
//! ## Determinism
//!
//! Given the same lines, the parser and validator always produce the same
//! store with the same candidate order. Resolution is deterministic except
//! for `Probability` candidates, and even those become reproducible when a
//! world seed is present (`SeedDeterministic`).

#[path = "engine/lifecycle.rs"]
mod lifecycle;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/store.rs"]
mod store;
#[path = "engine/validate.rs"]
mod validate;

pub use lifecycle::Controller;
pub use parser::parse;
pub use resolve::Context;
pub use store::RuleStore;
