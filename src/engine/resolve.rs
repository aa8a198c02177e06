//! Replacement resolution.
//!
//! The per-lookup decision algorithm. Called once for every biome the host
//! places, potentially from many worker threads at once, so the hot path
//! stays allocation-light and the empty-store fast path touches neither the
//! registry nor any randomness.
//!
//! ```text
//! id ──┬─ store empty ──────────────► id (fast path)
//!      ├─ direct candidates? ──┬─ first selected ─► target (if still valid)
//!      │                       └─ none fired ─────► id   (tags NOT consulted)
//!      ├─ first matching tag ──┬─ first selected ─► target (if still valid)
//!      │                       └─ none fired ─────► id   (later tags NOT consulted)
//!      └─ nothing matched ─────────────────────────► id
//! ```
//!
//! Resolution never fails: there is no panicking operation on any path, and
//! every absent-context or stale-registry situation degrades to "return the
//! input unchanged" with a log line.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::store::RuleStore;
use crate::{BiomeId, Candidate, Registry, SelectionPolicy};

/// World-gen chunks are 16 blocks on a side; blend gating measures distance
/// to the center of the lookup position's chunk.
const CHUNK_SIZE: f64 = 16.0;

/// Per-lookup context. Both fields are optional: a host that never uses
/// seed-stable or blend rules can pass `Context::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Context {
    /// World seed, required by `seed_stable` rules.
    pub seed: Option<u64>,
    /// Lookup position on the horizontal plane, required by `blend_range`
    /// rules.
    pub pos: Option<(f64, f64)>,
}

/// Resolve `id` against the rule snapshot. Returns the replacement biome, or
/// `id` unchanged when no rule applies.
pub fn resolve(store: &RuleStore, registry: &dyn Registry, id: &BiomeId, ctx: &Context) -> BiomeId {
    if store.is_empty() {
        return id.clone();
    }

    let direct = store.direct(id);
    if !direct.is_empty() {
        for candidate in direct {
            if selected(candidate, id, ctx) {
                return apply(registry, id, candidate);
            }
        }
        // A direct rule exists for this biome: it takes total precedence,
        // even when none of its candidates fired.
        return id.clone();
    }

    for (tag, candidates) in store.tags() {
        if registry.has_tag(id, tag) {
            for candidate in candidates {
                if selected(candidate, id, ctx) {
                    return apply(registry, id, candidate);
                }
            }
            // First matching tag wins the lookup, fired or not.
            return id.clone();
        }
    }

    id.clone()
}

/// Final registry check before handing out a replacement. A target that was
/// valid at validation time may have vanished if the registry epoch moved;
/// in that case the original biome is kept rather than a dangling id.
fn apply(registry: &dyn Registry, original: &BiomeId, candidate: &Candidate) -> BiomeId {
    if registry.exists(&candidate.target) {
        log::debug!("replacing {original} with {}", candidate.target);
        candidate.target.clone()
    } else {
        log::warn!(
            "replacement target {} no longer in registry, keeping {original}",
            candidate.target
        );
        original.clone()
    }
}

fn selected(candidate: &Candidate, source: &BiomeId, ctx: &Context) -> bool {
    match candidate.policy {
        SelectionPolicy::Always => true,
        SelectionPolicy::Probability(p) => roll(p, &mut rand::thread_rng()),
        SelectionPolicy::SeedDeterministic(p) => match ctx.seed {
            Some(seed) => roll(p, &mut seeded_rng(seed, source)),
            None => {
                log::debug!("seed-stable rule for {source} skipped: no world seed in context");
                false
            }
        },
        SelectionPolicy::BlendRadius(radius) => within_blend_range(radius, ctx),
    }
}

/// Uniform draw in `[0, 1)` against `p`. The comparison is strict so both
/// bounds are exact: no draw can satisfy `p = 0.0`, every draw satisfies
/// `p = 1.0`.
fn roll<R: Rng>(p: f64, rng: &mut R) -> bool {
    rng.gen_range(0.0..1.0) < p
}

/// Generator for seed-stable rolls: the same `(seed, id)` pair yields the
/// same stream on every run, thread, and process.
fn seeded_rng(seed: u64, id: &BiomeId) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(mix(seed, id))
}

/// FNV-1a over the seed bytes followed by the id text. Different ids under
/// the same world seed land on unrelated streams.
fn mix(seed: u64, id: &BiomeId) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in seed.to_le_bytes() {
        hash = (hash ^ u64::from(byte)).wrapping_mul(PRIME);
    }
    for byte in id.as_str().bytes() {
        hash = (hash ^ u64::from(byte)).wrapping_mul(PRIME);
    }
    hash
}

fn within_blend_range(radius: f64, ctx: &Context) -> bool {
    if radius <= 0.0 {
        return true;
    }
    let Some((x, z)) = ctx.pos else {
        return false;
    };
    let center_x = (x / CHUNK_SIZE).floor() * CHUNK_SIZE + CHUNK_SIZE / 2.0;
    let center_z = (z / CHUNK_SIZE).floor() * CHUNK_SIZE + CHUNK_SIZE / 2.0;
    let (dx, dz) = (x - center_x, z - center_z);
    (dx * dx + dz * dz).sqrt() <= radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::parse;
    use crate::engine::validate::validate;
    use crate::FixedRegistry;

    fn id(raw: &str) -> BiomeId {
        BiomeId::parse(raw).unwrap()
    }

    fn store_from(lines: &[&str], registry: &FixedRegistry) -> RuleStore {
        let (raw, _) = parse(lines.iter().copied());
        let (store, _) = validate(&raw, registry);
        store
    }

    #[test]
    fn empty_store_passes_through() {
        // A registry that panics proves the fast path never touches it.
        struct Untouchable;
        impl Registry for Untouchable {
            fn exists(&self, _: &BiomeId) -> bool {
                unreachable!("fast path must not consult the registry")
            }
            fn has_tag(&self, _: &BiomeId, _: &crate::TagId) -> bool {
                unreachable!("fast path must not consult the registry")
            }
        }

        let store = RuleStore::default();
        let out = resolve(&store, &Untouchable, &id("minecraft:plains"), &Context::default());
        assert_eq!(out, id("minecraft:plains"));
    }

    #[test]
    fn direct_rule_replaces() {
        let registry = FixedRegistry::with_ids(["minecraft:dark_forest", "minecraft:cherry_grove"]);
        let store = store_from(&["minecraft:dark_forest > minecraft:cherry_grove"], &registry);

        let out = resolve(&store, &registry, &id("minecraft:dark_forest"), &Context::default());
        assert_eq!(out, id("minecraft:cherry_grove"));
    }

    #[test]
    fn candidates_evaluate_in_declared_order() {
        let registry =
            FixedRegistry::with_ids(["minecraft:plains", "minecraft:desert", "minecraft:savanna"]);
        let store = store_from(
            &["minecraft:plains > minecraft:desert 0.0", "minecraft:plains > minecraft:savanna"],
            &registry,
        );

        // First candidate can never fire; the second always does.
        let out = resolve(&store, &registry, &id("minecraft:plains"), &Context::default());
        assert_eq!(out, id("minecraft:savanna"));
    }

    #[test]
    fn direct_rule_shadows_tag_rules_even_when_it_never_fires() {
        let mut registry = FixedRegistry::with_ids(["minecraft:birch_forest", "minecraft:desert"]);
        let tag = crate::TagId::parse("minecraft:is_forest").unwrap();
        registry.insert_tag_member(tag, id("minecraft:birch_forest"));

        let store = store_from(
            &[
                "minecraft:birch_forest > minecraft:desert 0.0",
                "#minecraft:is_forest > minecraft:desert",
            ],
            &registry,
        );

        for _ in 0..64 {
            let out = resolve(&store, &registry, &id("minecraft:birch_forest"), &Context::default());
            assert_eq!(out, id("minecraft:birch_forest"));
        }
    }

    #[test]
    fn first_matching_tag_wins_and_later_tags_are_not_consulted() {
        let mut registry = FixedRegistry::with_ids(["minecraft:taiga", "minecraft:desert", "minecraft:jungle"]);
        let cold = crate::TagId::parse("minecraft:is_cold").unwrap();
        let forest = crate::TagId::parse("minecraft:is_forest").unwrap();
        registry.insert_tag_member(cold.clone(), id("minecraft:taiga"));
        registry.insert_tag_member(forest.clone(), id("minecraft:taiga"));

        // The first-declared tag matches but its only candidate never
        // fires; the second tag would always fire, yet must not be reached.
        let store = store_from(
            &[
                "#minecraft:is_cold > minecraft:desert 0.0",
                "#minecraft:is_forest > minecraft:jungle",
            ],
            &registry,
        );

        for _ in 0..64 {
            let out = resolve(&store, &registry, &id("minecraft:taiga"), &Context::default());
            assert_eq!(out, id("minecraft:taiga"));
        }
    }

    #[test]
    fn probability_bounds_are_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..4096 {
            assert!(!roll(0.0, &mut rng));
        }
        for _ in 0..4096 {
            assert!(roll(1.0, &mut rng));
        }
    }

    #[test]
    fn seeded_rolls_are_reproducible() {
        let plains = id("minecraft:plains");
        let first: Vec<f64> =
            (0..8).map(|_| seeded_rng(42, &plains).gen_range(0.0..1.0)).collect();
        let second: Vec<f64> =
            (0..8).map(|_| seeded_rng(42, &plains).gen_range(0.0..1.0)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn different_ids_draw_independently_under_one_seed() {
        let a = seeded_rng(42, &id("minecraft:plains")).gen_range(0.0..1.0);
        let b = seeded_rng(42, &id("minecraft:desert")).gen_range(0.0..1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn seed_stable_resolution_is_stable_across_calls() {
        let mut registry = FixedRegistry::with_ids(["minecraft:birch_forest", "minecraft:desert"]);
        let tag = crate::TagId::parse("minecraft:is_forest").unwrap();
        registry.insert_tag_member(tag, id("minecraft:birch_forest"));

        let store =
            store_from(&["#minecraft:is_forest > minecraft:desert 0.5 seed_stable=true"], &registry);

        let ctx = Context { seed: Some(123_456_789), ..Context::default() };
        let first = resolve(&store, &registry, &id("minecraft:birch_forest"), &ctx);
        for _ in 0..32 {
            assert_eq!(resolve(&store, &registry, &id("minecraft:birch_forest"), &ctx), first);
        }
    }

    #[test]
    fn seed_stable_rule_needs_a_seed() {
        let registry = FixedRegistry::with_ids(["minecraft:plains", "minecraft:desert"]);
        let store =
            store_from(&["minecraft:plains > minecraft:desert seed_stable=true"], &registry);

        let out = resolve(&store, &registry, &id("minecraft:plains"), &Context::default());
        assert_eq!(out, id("minecraft:plains"));
    }

    #[test]
    fn blend_gate_measures_distance_to_chunk_center() {
        let registry = FixedRegistry::with_ids(["minecraft:badlands", "minecraft:desert"]);
        let store =
            store_from(&["minecraft:badlands > minecraft:desert blend_range=3"], &registry);

        // Chunk [0,16) has its center at (8, 8).
        let near = Context { pos: Some((9.0, 9.0)), ..Context::default() };
        let far = Context { pos: Some((1.0, 1.0)), ..Context::default() };
        assert_eq!(resolve(&store, &registry, &id("minecraft:badlands"), &near), id("minecraft:desert"));
        assert_eq!(resolve(&store, &registry, &id("minecraft:badlands"), &far), id("minecraft:badlands"));
    }

    #[test]
    fn zero_blend_range_is_unconditional_and_needs_no_position() {
        let registry = FixedRegistry::with_ids(["minecraft:badlands", "minecraft:desert"]);
        let store =
            store_from(&["minecraft:badlands > minecraft:desert blend_range=0"], &registry);

        let out = resolve(&store, &registry, &id("minecraft:badlands"), &Context::default());
        assert_eq!(out, id("minecraft:desert"));
    }

    #[test]
    fn positive_blend_range_without_position_never_fires() {
        let registry = FixedRegistry::with_ids(["minecraft:badlands", "minecraft:desert"]);
        let store =
            store_from(&["minecraft:badlands > minecraft:desert blend_range=8"], &registry);

        let out = resolve(&store, &registry, &id("minecraft:badlands"), &Context::default());
        assert_eq!(out, id("minecraft:badlands"));
    }

    #[test]
    fn vanished_target_falls_back_to_original() {
        // Validate against a registry that knows the target, then resolve
        // against one that no longer does (a new registry epoch).
        let full = FixedRegistry::with_ids(["minecraft:plains", "minecraft:desert"]);
        let store = store_from(&["minecraft:plains > minecraft:desert"], &full);

        let shrunk = FixedRegistry::with_ids(["minecraft:plains"]);
        let out = resolve(&store, &shrunk, &id("minecraft:plains"), &Context::default());
        assert_eq!(out, id("minecraft:plains"));
    }
}
