use std::collections::HashSet;

const EXACT_MATCH: f64 = 1.0;
const PHRASE_MATCH: f64 = 0.85;
const MIN_PHRASE_TOKENS: usize = 4;

const STOPWORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "between", "both", "could",
    "does", "doing", "down", "during", "each", "from", "further", "have", "having", "here",
    "into", "itself", "just", "more", "most", "must", "only", "other", "over", "same", "should",
    "some", "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "under", "until", "very", "were", "what", "when", "where", "which",
    "while", "will", "with", "would", "your",
];

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && haystack.len() >= needle.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

fn is_significant(term: &str) -> bool {
    term.chars().count() > 3 && !STOPWORDS.contains(&term)
}

/// Score of a single belief against a narrative, in [0, 1].
pub fn belief_score(narrative: &str, belief: &str) -> f64 {
    let lowered_belief = belief.trim().to_lowercase();
    if lowered_belief.is_empty() {
        return 0.0;
    }
    if narrative.to_lowercase().contains(&lowered_belief) {
        return EXACT_MATCH;
    }

    let narrative_tokens = tokens(narrative);
    let belief_tokens = tokens(belief);
    if contains_run(&narrative_tokens, &belief_tokens) {
        return EXACT_MATCH;
    }

    if belief_tokens.len() >= MIN_PHRASE_TOKENS {
        let half = belief_tokens.len().div_ceil(2);
        if belief_tokens
            .windows(half)
            .any(|phrase| contains_run(&narrative_tokens, phrase))
        {
            return PHRASE_MATCH;
        }
    }

    let mut seen = HashSet::new();
    let terms: Vec<&String> = belief_tokens
        .iter()
        .filter(|t| is_significant(t) && seen.insert(t.as_str()))
        .collect();
    if terms.is_empty() {
        return 0.0;
    }

    let present: HashSet<&str> = narrative_tokens.iter().map(String::as_str).collect();
    let matched = terms.iter().filter(|t| present.contains(t.as_str())).count();
    #[allow(clippy::cast_precision_loss)]
    let fraction = matched as f64 / terms.len() as f64;

    let score = if fraction > 0.5 {
        0.5 + (fraction - 0.5) * 2.0
    } else {
        fraction * 1.8
    };
    score.min(1.0)
}

/// Mean belief score of `narrative` over `beliefs`. No beliefs means nothing
/// to drift from, which scores 1.0.
#[allow(clippy::cast_precision_loss)]
pub fn score_alignment<S: AsRef<str>>(narrative: &str, beliefs: &[S]) -> f64 {
    if beliefs.is_empty() {
        return 1.0;
    }
    let total: f64 = beliefs
        .iter()
        .map(|b| belief_score(narrative, b.as_ref()))
        .sum();
    total / beliefs.len() as f64
}

/// Beliefs no narrative in `recent` scores above `threshold`, in belief order.
pub fn detect_forgotten_beliefs<N, B>(recent: &[N], beliefs: &[B], threshold: f64) -> Vec<String>
where
    N: AsRef<str>,
    B: AsRef<str>,
{
    beliefs
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|belief| {
            !recent
                .iter()
                .any(|narrative| belief_score(narrative.as_ref(), belief) > threshold)
        })
        .map(str::to_string)
        .collect()
}
