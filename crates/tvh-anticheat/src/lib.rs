//! TVH Anti-Cheat: static source-text heuristic for hardcoded returns.
//!
//! Catches submissions that pass structural validation by returning the
//! fixture's expected aggregate as a constant instead of computing it.
//! Best-effort and syntactic only: false negatives are acceptable
//! (constants can be disguised), false positives are not — the heuristic
//! fires only when the expected value occurs as a literal in the source
//! on a return path, never because the produced output merely equals the
//! expected output.
//!
//! Matching runs over normalized text (lowercased, whitespace-stripped,
//! binding keywords removed) against a canonical serialization of the
//! produced table (compact JSON, sorted object keys), so incidental
//! formatting differences do not defeat it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tvh_core::Table;

lazy_static! {
    /// Identifier immediately before an `=` at the end of a prefix.
    static ref BOUND_IDENT: Regex = Regex::new(r"([a-z_][a-z0-9_]*)=$").unwrap();
    /// Binding keywords that would otherwise glue onto the identifier.
    static ref BINDING_KEYWORDS: Regex = Regex::new(r"\b(let|mut)\b").unwrap();
}

/// Outcome of the hardcoding heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiCheatVerdict {
    pub suspicious: bool,
    pub evidence: String,
}

impl AntiCheatVerdict {
    fn clean(evidence: impl Into<String>) -> Self {
        AntiCheatVerdict {
            suspicious: false,
            evidence: evidence.into(),
        }
    }

    fn flagged(evidence: impl Into<String>) -> Self {
        AntiCheatVerdict {
            suspicious: true,
            evidence: evidence.into(),
        }
    }
}

/// Lowercase, drop binding keywords, strip all whitespace.
pub fn normalize(source: &str) -> String {
    let lowered = source.to_lowercase();
    let unbound = BINDING_KEYWORDS.replace_all(&lowered, "");
    unbound.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Canonical normalized literal form of a table: its rows as compact JSON
/// with sorted object keys, then [`normalize`]d.
pub fn canonical_literal(table: &Table) -> String {
    normalize(&table.to_json_rows().to_string())
}

/// Analyze one capability's raw source against its actually-produced
/// output. Two tests, mirroring the grading heuristic:
///
/// 1. direct return: the canonical literal appears immediately after a
///    return marker (`return` or an `ok(` wrapper);
/// 2. indirection: the literal is bound to an identifier and that same
///    identifier appears after a return marker.
pub fn analyze(source: &str, produced: &Table) -> AntiCheatVerdict {
    if produced.n_rows() == 0 {
        // An empty table serializes to "[]", which matches far too much.
        return AntiCheatVerdict::clean("empty output, literal scan skipped");
    }
    let norm = normalize(source);
    let canon = canonical_literal(produced);

    for (pos, _) in norm.match_indices(canon.as_str()) {
        let prefix = &norm[..pos];
        if prefix.ends_with("return") || prefix.ends_with("ok(") {
            debug!("direct literal return matched at offset {pos}");
            return AntiCheatVerdict::flagged("direct return of the expected output literal");
        }
        if let Some(caps) = BOUND_IDENT.captures(prefix) {
            let ident = &caps[1];
            if norm.contains(&format!("return{ident}")) || norm.contains(&format!("ok({ident})")) {
                debug!(ident, "indirect literal return matched");
                return AntiCheatVerdict::flagged(format!(
                    "expected output literal bound to '{ident}' and returned"
                ));
            }
        }
    }
    AntiCheatVerdict::clean("no hardcoded return detected")
}
