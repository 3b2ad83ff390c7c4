//! Text cleaning, phrase folding, and keyword weighting.
//!
//! Produces the normalized token stream the vector space is built from:
//! lowercase, URL-free, restricted to letters/periods/hyphens, stopword-free,
//! with role phrases folded into single tokens and role keywords amplified by
//! repetition. The output is a single space-joined string; empty means the
//! document contributes nothing and is excluded from scoring.

use std::time::Instant;

use tracing::warn;

use crate::config::Limits;
use crate::ranking::profile::RoleProfile;
use crate::ranking::stopwords::is_stopword;

/// Budget is checked once per this many tokens during the scan.
const BUDGET_CHECK_INTERVAL: usize = 1024;

/// Cleans `text` into a weighted token stream.
///
/// Steps: lowercase → strip URLs → keep letters/whitespace/`.`/`-` → truncate
/// to `limits.max_chars` → tokenize → drop stopwords and tokens of length
/// ≤ 2 → fold role phrases (longest match first) → repeat role keywords
/// `limits.keyword_weight` times.
///
/// Returns the empty string for empty input, for input that cleans down to
/// nothing, and when the soft wall-clock budget runs out mid-scan.
pub fn clean_text(text: &str, profile: Option<&RoleProfile>, limits: &Limits) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let started = Instant::now();

    let cleaned = strip_and_filter(text, limits.max_chars);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    // A role with no keyword entries degrades folding and weighting to no-ops.
    let profile = profile.filter(|p| !p.is_empty());

    let mut kept: Vec<String> = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i % BUDGET_CHECK_INTERVAL == 0 && started.elapsed() > limits.clean_budget {
            warn!(elapsed_ms = started.elapsed().as_millis() as u64, "cleaning budget exceeded, dropping document");
            return String::new();
        }
        let token = tokens[i];
        if is_stopword(token) || token.len() <= 2 {
            i += 1;
            continue;
        }
        // Longest match first: the 3-word window is tried before the 2-word
        // window so a long keyword is never shadowed by its own prefix.
        let mut folded = false;
        if let Some(p) = profile {
            for span in [3usize, 2] {
                if i + span <= tokens.len() {
                    let phrase = tokens[i..i + span].join(" ");
                    if p.contains(&phrase) {
                        kept.push(phrase);
                        i += span;
                        folded = true;
                        break;
                    }
                }
            }
        }
        if !folded {
            kept.push(token.to_string());
            i += 1;
        }
    }

    if kept.is_empty() {
        return String::new();
    }

    match profile {
        Some(p) => {
            let weight = limits.keyword_weight.max(1);
            let mut weighted: Vec<String> = Vec::with_capacity(kept.len());
            for token in kept {
                let repeat = if p.contains(&token) { weight } else { 1 };
                for _ in 0..repeat {
                    weighted.push(token.clone());
                }
            }
            weighted.join(" ")
        }
        None => kept.join(" "),
    }
}

/// Lowercases, drops URL words, filters each word down to ASCII letters,
/// periods, and hyphens, and truncates the result to `max_chars`.
fn strip_and_filter(text: &str, max_chars: usize) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len().min(max_chars + 1));
    for word in lower.split_whitespace() {
        if is_url(word) {
            continue;
        }
        let mut filtered = String::with_capacity(word.len());
        for c in word.chars() {
            if c.is_ascii_alphabetic() || c == '.' || c == '-' {
                filtered.push(c);
            }
        }
        if filtered.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&filtered);
        if out.len() >= max_chars {
            // Output is pure ASCII, so a byte truncation is a char truncation.
            out.truncate(max_chars);
            break;
        }
    }
    out
}

fn is_url(word: &str) -> bool {
    word.starts_with("http://") || word.starts_with("https://") || word.starts_with("www.")
}
