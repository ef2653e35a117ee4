//! Regex-driven string generation
//!
//! OpenAPI patterns come in many dialects (JavaScript literals, anchored Java
//! patterns, inline flags). [`clean_pattern`] reduces them to a plain regex
//! body that `proptest`'s regex strategy can sample from.

use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{Config as RunnerConfig, RngAlgorithm, TestRng, TestRunner};
use rand::Rng;

/// Substituted when no string matching the pattern could be produced.
pub const PATTERN_PLACEHOLDER: &str = "changeOrSimplifyThePattern";

/// Attempts at hitting a length window before giving up.
const LENGTH_ATTEMPTS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("unsupported pattern '{pattern}': {reason}")]
    Invalid { pattern: String, reason: String },
    #[error("no string matching '{pattern}' with length {min}..={max}")]
    LengthUnsatisfiable {
        pattern: String,
        min: usize,
        max: usize,
    },
}

/// Strip delimiters, anchors and inline flags; rewrite `\d` `\w` `\s` to ASCII classes.
#[must_use]
pub fn clean_pattern(pattern: &str) -> String {
    let mut p = pattern.trim();

    if let Some(body) = p.strip_prefix('/') {
        if let Some(end) = body.rfind('/') {
            if body[end + 1..].chars().all(|f| "gimsuy".contains(f)) {
                p = &body[..end];
            }
        }
    }

    let mut cleaned = p.replace("(?i)", "");
    cleaned = cleaned.replace("(^$|", "(").replace("|^$)", ")");

    if let Some(rest) = cleaned.strip_prefix('^') {
        cleaned = rest.to_string();
    }
    if cleaned.ends_with('$') && !cleaned.ends_with("\\$") {
        cleaned.pop();
    }

    ascii_classes(&cleaned)
}

fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(next) = chars.next() else {
                    out.push(c);
                    break;
                };
                let class = match next {
                    'd' => Some("0-9"),
                    'w' => Some("a-zA-Z0-9_"),
                    's' => Some(" \\t"),
                    _ => None,
                };
                match (class, in_class) {
                    (Some(body), true) => out.push_str(body),
                    (Some(body), false) => {
                        out.push('[');
                        out.push_str(body);
                        out.push(']');
                    }
                    (None, _) => {
                        out.push(c);
                        out.push(next);
                    }
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Sample one string matching `pattern`.
///
/// # Errors
///
/// Returns [`PatternError::Invalid`] if the pattern cannot be compiled.
pub fn generate_matching(pattern: &str, rng: &mut impl Rng) -> Result<String, PatternError> {
    let cleaned = clean_pattern(pattern);
    let invalid = |reason: String| PatternError::Invalid {
        pattern: pattern.to_string(),
        reason,
    };
    let strategy = proptest::string::string_regex(&cleaned).map_err(|e| invalid(e.to_string()))?;

    let mut seed = [0u8; 32];
    rng.fill(&mut seed);
    let mut runner = TestRunner::new_with_rng(
        RunnerConfig::default(),
        TestRng::from_seed(RngAlgorithm::ChaCha, &seed),
    );
    let tree = strategy
        .new_tree(&mut runner)
        .map_err(|e| invalid(format!("{e:?}")))?;
    Ok(tree.current())
}

/// Sample a string matching `pattern` whose length (in chars) lies in `[min, max]`.
///
/// # Errors
///
/// Returns [`PatternError::LengthUnsatisfiable`] when no sample fits the window.
pub fn generate_matching_with_length(
    pattern: &str,
    min: usize,
    max: usize,
    rng: &mut impl Rng,
) -> Result<String, PatternError> {
    for _ in 0..LENGTH_ATTEMPTS {
        let candidate = generate_matching(pattern, rng)?;
        if (min..=max).contains(&candidate.chars().count()) {
            return Ok(candidate);
        }
    }
    Err(PatternError::LengthUnsatisfiable {
        pattern: pattern.to_string(),
        min,
        max,
    })
}
