//! Rule text parsing.
//!
//! Turns raw config lines into a [`RawRuleSet`]. This is a pure function:
//! no I/O, no registry, no randomness. Anything the parser cannot
//! understand becomes a [`Diagnostic`] and the line is skipped; one bad
//! line never aborts the rest of the file.
//!
//! ## Dialect
//!
//! ```text
//! ! comment                         lines starting with '!' are ignored
//! muteChatInfo = false              option line ('=' before any '>')
//! minecraft:a > minecraft:b         direct rule
//! #minecraft:is_x > minecraft:b     tag rule ('#' marks the source as a tag)
//! a > b 0.5                         probability modifier (clamped to [0,1])
//! a > b 0.5 seed_stable=true        probability rolled seed-deterministically
//! a > b blend_range=8               spatial blend gate (takes precedence
//!                                   over a bare probability on the same line)
//! ```
//!
//! Unrecognized option keys are ignored silently. Unrecognized `key=value`
//! rule modifiers produce a diagnostic but keep the rule.
//!
//! File order is significant and preserved: multiple rules for the same
//! source are evaluated in the order written, and tag rules are tried in
//! declaration order.

use crate::{BiomeId, Candidate, Diagnostic, RawRuleSet, RuleOptions, SelectionPolicy, TagId};

/// Lines whose first non-whitespace character is this are comments.
pub const COMMENT_MARKER: char = '!';
const TAG_MARKER: char = '#';
const RULE_SEPARATOR: char = '>';

/// Parse config lines into a raw rule set plus diagnostics for everything
/// that was skipped or ignored.
pub fn parse<I>(lines: I) -> (RawRuleSet, Vec<Diagnostic>)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut raw = RawRuleSet::default();
    let mut diagnostics = Vec::new();

    for (index, line) in lines.into_iter().enumerate() {
        let number = index + 1;
        let line = line.as_ref().trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        // Option line: '=' appearing before any rule separator.
        if let Some(eq) = line.find('=') {
            if line.find(RULE_SEPARATOR).is_none_or(|sep| eq < sep) {
                apply_option(&line[..eq], &line[eq + 1..], &mut raw.options);
                continue;
            }
        }

        let Some((source, rest)) = line.split_once(RULE_SEPARATOR) else {
            diagnostics.push(Diagnostic::MalformedLine {
                line: number,
                text: line.to_string(),
                why: "missing '>' separator".to_string(),
            });
            continue;
        };

        let source = source.trim();
        let Some((target, policy)) = parse_replacement(rest, number, line, &mut diagnostics) else {
            continue;
        };
        let candidate = Candidate { target, policy };

        match source.strip_prefix(TAG_MARKER) {
            Some(tag_token) => match TagId::parse(tag_token) {
                Some(tag) => raw.tags.push((tag, candidate)),
                None => diagnostics.push(Diagnostic::MalformedLine {
                    line: number,
                    text: line.to_string(),
                    why: format!("invalid tag id '{}'", tag_token.trim()),
                }),
            },
            None => match BiomeId::parse(source) {
                Some(id) => raw.direct.push((id, candidate)),
                None => diagnostics.push(Diagnostic::MalformedLine {
                    line: number,
                    text: line.to_string(),
                    why: format!("invalid source id '{source}'"),
                }),
            },
        }
    }

    (raw, diagnostics)
}

fn apply_option(key: &str, value: &str, options: &mut RuleOptions) {
    let (key, value) = (key.trim(), value.trim());
    // Unknown keys are intentionally not diagnostics: option lines are
    // shared with host-side settings the engine does not care about.
    if key == "muteChatInfo" {
        options.mute_chat_info = value.eq_ignore_ascii_case("true");
    }
}

/// Parse the right-hand side of a rule: target id plus optional modifiers.
fn parse_replacement(
    rest: &str,
    number: usize,
    line: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<(BiomeId, SelectionPolicy)> {
    let malformed =
        |why: String| Diagnostic::MalformedLine { line: number, text: line.to_string(), why };

    let mut parts = rest.split_whitespace();
    let Some(target_token) = parts.next() else {
        diagnostics.push(malformed("missing replacement target".to_string()));
        return None;
    };
    let Some(target) = BiomeId::parse(target_token) else {
        diagnostics.push(malformed(format!("invalid target id '{target_token}'")));
        return None;
    };

    let mut probability = None;
    let mut blend_range = None;
    let mut seed_stable = false;

    for modifier in parts {
        if let Some((key, value)) = modifier.split_once('=') {
            match key {
                "blend_range" => match value.parse::<f64>() {
                    Ok(radius) if radius.is_finite() => blend_range = Some(radius.max(0.0)),
                    _ => {
                        diagnostics.push(malformed(format!("non-numeric blend_range '{value}'")));
                        return None;
                    }
                },
                "seed_stable" => seed_stable = value.eq_ignore_ascii_case("true"),
                _ => diagnostics.push(Diagnostic::UnknownModifier {
                    line: number,
                    modifier: modifier.to_string(),
                }),
            }
        } else {
            match modifier.parse::<f64>() {
                Ok(p) if p.is_finite() => probability = Some(p.clamp(0.0, 1.0)),
                _ => {
                    diagnostics.push(malformed(format!("non-numeric probability '{modifier}'")));
                    return None;
                }
            }
        }
    }

    let policy = match (blend_range, probability, seed_stable) {
        (Some(radius), _, _) => SelectionPolicy::BlendRadius(radius),
        (None, Some(p), true) => SelectionPolicy::SeedDeterministic(p),
        (None, Some(p), false) => SelectionPolicy::Probability(p),
        (None, None, true) => SelectionPolicy::SeedDeterministic(1.0),
        (None, None, false) => SelectionPolicy::Always,
    };
    Some((target, policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> BiomeId {
        BiomeId::parse(raw).unwrap()
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let (raw, diagnostics) = parse(["", "   ", "! a comment", "  ! indented comment"]);
        assert_eq!(raw, RawRuleSet::default());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn direct_rule_defaults_to_always() {
        let (raw, diagnostics) = parse(["minecraft:dark_forest > minecraft:cherry_grove"]);
        assert!(diagnostics.is_empty());
        assert_eq!(
            raw.direct,
            vec![(
                id("minecraft:dark_forest"),
                Candidate { target: id("minecraft:cherry_grove"), policy: SelectionPolicy::Always }
            )]
        );
    }

    #[test]
    fn tag_rule_with_probability() {
        let (raw, diagnostics) = parse(["#minecraft:is_forest > minecraft:desert 0.5"]);
        assert!(diagnostics.is_empty());
        let (tag, candidate) = &raw.tags[0];
        assert_eq!(tag.as_str(), "minecraft:is_forest");
        assert_eq!(candidate.policy, SelectionPolicy::Probability(0.5));
    }

    #[test]
    fn probability_is_clamped() {
        let (raw, _) = parse(["a > b 1.7", "c > d -0.2"]);
        assert_eq!(raw.direct[0].1.policy, SelectionPolicy::Probability(1.0));
        assert_eq!(raw.direct[1].1.policy, SelectionPolicy::Probability(0.0));
    }

    #[test]
    fn seed_stable_modifier() {
        let (raw, _) = parse(["a > b 0.5 seed_stable=true", "c > d seed_stable=true", "e > f seed_stable=false 0.3"]);
        assert_eq!(raw.direct[0].1.policy, SelectionPolicy::SeedDeterministic(0.5));
        assert_eq!(raw.direct[1].1.policy, SelectionPolicy::SeedDeterministic(1.0));
        assert_eq!(raw.direct[2].1.policy, SelectionPolicy::Probability(0.3));
    }

    #[test]
    fn blend_range_modifier() {
        let (raw, diagnostics) = parse(["minecraft:badlands > minecraft:desert blend_range=8"]);
        assert!(diagnostics.is_empty());
        assert_eq!(raw.direct[0].1.policy, SelectionPolicy::BlendRadius(8.0));
    }

    #[test]
    fn negative_blend_range_is_floored_to_zero() {
        let (raw, _) = parse(["a > b blend_range=-3"]);
        assert_eq!(raw.direct[0].1.policy, SelectionPolicy::BlendRadius(0.0));
    }

    #[test]
    fn option_lines_update_options() {
        let (raw, diagnostics) = parse(["muteChatInfo = true", "someFutureKey = 7"]);
        assert!(raw.options.mute_chat_info);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn equals_after_separator_is_not_an_option_line() {
        // 'blend_range=2' contains '=', but the '>' comes first.
        let (raw, _) = parse(["minecraft:a > minecraft:b blend_range=2"]);
        assert_eq!(raw.direct.len(), 1);
        assert_eq!(raw.options, RuleOptions::default());
    }

    #[test]
    fn malformed_lines_are_skipped_with_diagnostics() {
        let lines = [
            "minecraft:foo",
            "minecraft:a > minecraft:b not_a_number",
            "minecraft:c >",
            "UPPER:case > minecraft:d",
            "minecraft:e > minecraft:f",
        ];
        let (raw, diagnostics) = parse(lines);

        // The one good line survives, everything else is diagnosed.
        assert_eq!(raw.direct, vec![(
            id("minecraft:e"),
            Candidate { target: id("minecraft:f"), policy: SelectionPolicy::Always }
        )]);
        assert_eq!(diagnostics.len(), 4);
        assert!(matches!(diagnostics[0], Diagnostic::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn unknown_modifier_keeps_the_rule() {
        let (raw, diagnostics) = parse(["a > b shimmer=3"]);
        assert_eq!(raw.direct.len(), 1);
        assert_eq!(raw.direct[0].1.policy, SelectionPolicy::Always);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnknownModifier { line: 1, modifier: "shimmer=3".to_string() }]
        );
    }

    #[test]
    fn file_order_is_preserved_per_source() {
        let lines = [
            "minecraft:plains > minecraft:desert 0.3",
            "#minecraft:is_cold > minecraft:ice_spikes",
            "minecraft:plains > minecraft:savanna",
            "#minecraft:is_warm > minecraft:jungle",
        ];
        let (raw, _) = parse(lines);
        let plains: Vec<_> = raw
            .direct
            .iter()
            .filter(|(source, _)| source == &id("minecraft:plains"))
            .map(|(_, c)| c.target.as_str())
            .collect();
        assert_eq!(plains, vec!["minecraft:desert", "minecraft:savanna"]);
        let tags: Vec<_> = raw.tags.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["minecraft:is_cold", "minecraft:is_warm"]);
    }

    #[test]
    fn split_happens_on_first_separator_only() {
        let (raw, diagnostics) = parse(["minecraft:a > minecraft:b > minecraft:c"]);
        // The second '>' lands in modifier position and is not a number.
        assert!(raw.direct.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }
}
