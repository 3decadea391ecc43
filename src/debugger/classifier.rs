use super::extract::{FailureDetails, extract_details};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified failure kind. Signatures added at runtime classify as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    RateLimit,
    Permission,
    NotFound,
    InvalidInput,
    Memory,
    Network,
    Dependency,
    Unknown,
    #[serde(untagged)]
    Other(String),
}

impl FailureKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Memory => "memory",
            Self::Network => "network",
            Self::Dependency => "dependency",
            Self::Unknown => "unknown",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether lowercased failure evidence carries a signature.
pub trait FailureMatcher: Send + Sync {
    fn matches(&self, evidence: &str) -> bool;
}

impl<F> FailureMatcher for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, evidence: &str) -> bool {
        self(evidence)
    }
}

#[derive(Debug, Clone)]
struct Keyword {
    text: String,
    whole_word: bool,
}

impl Keyword {
    fn found_in(&self, evidence: &str) -> bool {
        if !self.whole_word {
            return evidence.contains(self.text.as_str());
        }
        evidence.match_indices(self.text.as_str()).any(|(start, hit)| {
            let before = evidence[..start].chars().next_back();
            let after = evidence[start + hit.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    }
}

/// Matches when any keyword occurs in the evidence. Short or ambiguous
/// keywords can be restricted to whole words, so `oom` ignores `zoom`.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<Keyword>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: Vec::new(),
        }
        .with_keywords(keywords, false)
    }

    /// Matcher whose keywords only count at word boundaries.
    pub fn whole_words<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: Vec::new(),
        }
        .with_keywords(keywords, true)
    }

    /// Add keywords that only count at word boundaries.
    #[must_use]
    pub fn with_whole_words<I, S>(self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_keywords(keywords, true)
    }

    fn with_keywords<I, S>(mut self, keywords: I, whole_word: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(|k| Keyword {
            text: k.into().to_lowercase(),
            whole_word,
        }));
        self
    }
}

impl FailureMatcher for KeywordMatcher {
    fn matches(&self, evidence: &str) -> bool {
        self.keywords.iter().any(|k| k.found_in(evidence))
    }
}

/// Status codes only count as whole tokens, so `line 4291` is not a 429.
fn status_code(code: &'static str) -> impl Fn(&str) -> bool + Send + Sync {
    move |evidence: &str| {
        evidence
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token == code)
    }
}

pub struct FailureSignature {
    pub kind: FailureKind,
    pub matcher: Box<dyn FailureMatcher>,
    pub confidence: f64,
    pub suggested_fix: String,
}

impl FailureSignature {
    pub fn new(
        kind: FailureKind,
        matcher: impl FailureMatcher + 'static,
        confidence: f64,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            matcher: Box::new(matcher),
            confidence,
            suggested_fix: suggested_fix.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub failure_type: FailureKind,
    pub confidence: f64,
    pub suggested_fix: String,
    pub details: FailureDetails,
}

pub const UNKNOWN_CONFIDENCE: f64 = 0.5;

/// Ordered signature list; the first match wins.
pub struct FailureClassifier {
    signatures: Vec<FailureSignature>,
}

impl FailureClassifier {
    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Append a signature after the existing ones.
    #[must_use]
    pub fn with_signature(mut self, signature: FailureSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn classify(&self, evidence: &str) -> RootCause {
        let lowered = evidence.to_lowercase();
        let details = extract_details(evidence);

        match self.signatures.iter().find(|s| s.matcher.matches(&lowered)) {
            Some(signature) => RootCause {
                failure_type: signature.kind.clone(),
                confidence: signature.confidence,
                suggested_fix: signature.suggested_fix.clone(),
                details,
            },
            None => RootCause {
                failure_type: FailureKind::Unknown,
                confidence: UNKNOWN_CONFIDENCE,
                suggested_fix: "Inspect the full failure evidence and loop context manually"
                    .to_string(),
                details,
            },
        }
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::empty()
            .with_signature(FailureSignature::new(
                FailureKind::Timeout,
                KeywordMatcher::new(["timeout", "timed out", "deadline exceeded"]),
                0.9,
                "Increase the operation timeout or split the work into smaller steps",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::RateLimit,
                KeywordMatcher::new(["rate limit", "rate-limit", "too many requests", "quota exceeded"]),
                0.85,
                "Back off and retry with exponential delay; reduce request frequency",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::RateLimit,
                status_code("429"),
                0.85,
                "Back off and retry with exponential delay; reduce request frequency",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::Permission,
                KeywordMatcher::new(["permission denied", "unauthorized", "forbidden", "access denied"]),
                0.85,
                "Verify the agent's tool and memory permissions and credentials",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::Permission,
                |e: &str| status_code("401")(e) || status_code("403")(e),
                0.85,
                "Verify the agent's tool and memory permissions and credentials",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::NotFound,
                KeywordMatcher::new(["not found", "no such file", "does not exist", "filenotfounderror"]),
                0.8,
                "Check that the referenced resource, path or identifier exists",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::NotFound,
                status_code("404"),
                0.8,
                "Check that the referenced resource, path or identifier exists",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::InvalidInput,
                KeywordMatcher::new(["valueerror", "typeerror", "malformed", "validation failed"])
                    .with_whole_words(["invalid"]),
                0.75,
                "Validate and sanitize inputs before invoking the action",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::Memory,
                KeywordMatcher::new(["out of memory", "memoryerror", "memory exhausted", "allocation failed"])
                    .with_whole_words(["oom", "oomkilled"]),
                0.8,
                "Reduce batch or context size and release unused resources",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::Network,
                KeywordMatcher::new([
                    "connection refused",
                    "connection reset",
                    "connectionerror",
                    "networkerror",
                    "unreachable",
                ])
                .with_whole_words(["network", "dns"]),
                0.75,
                "Check connectivity to the remote endpoint and retry",
            ))
            .with_signature(FailureSignature::new(
                FailureKind::Dependency,
                KeywordMatcher::new([
                    "modulenotfounderror",
                    "importerror",
                    "no module named",
                    "dependency",
                    "cannot find package",
                ]),
                0.7,
                "Install or pin the missing dependency",
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_builtin_kind_is_recognised() {
        let classifier = FailureClassifier::default();
        let cases = [
            ("operation timed out", FailureKind::Timeout, 0.9),
            ("HTTP 429 Too Many Requests", FailureKind::RateLimit, 0.85),
            ("PermissionError: [Errno 13] Permission denied", FailureKind::Permission, 0.85),
            ("resource returned 404", FailureKind::NotFound, 0.8),
            ("ValueError: bad literal", FailureKind::InvalidInput, 0.75),
            ("MemoryError", FailureKind::Memory, 0.8),
            ("ConnectionError: connection refused", FailureKind::Network, 0.75),
            ("ImportError: cannot import name", FailureKind::Dependency, 0.7),
        ];
        for (evidence, kind, confidence) in cases {
            let cause = classifier.classify(evidence);
            assert_eq!(cause.failure_type, kind, "evidence: {evidence}");
            assert!((cause.confidence - confidence).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn unmatched_evidence_is_unknown() {
        let cause = FailureClassifier::default().classify("something odd happened");
        assert_eq!(cause.failure_type, FailureKind::Unknown);
        assert!((cause.confidence - UNKNOWN_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn earlier_signature_wins() {
        let cause = FailureClassifier::default().classify("network timeout while fetching");
        assert_eq!(cause.failure_type, FailureKind::Timeout);
    }

    #[test]
    fn status_codes_match_whole_tokens_only() {
        let cause = FailureClassifier::default().classify("failure at line 4291");
        assert_eq!(cause.failure_type, FailureKind::Unknown);
    }

    #[test]
    fn short_keywords_ignore_longer_words() {
        let classifier = FailureClassifier::default();
        for evidence in [
            "KeyError: 'zoom_level'",
            "booking failed: room capacity reached",
            "bloom filter rebuilt",
            "validinvalidity check skipped",
        ] {
            let cause = classifier.classify(evidence);
            assert_eq!(cause.failure_type, FailureKind::Unknown, "evidence: {evidence}");
        }
    }

    #[test]
    fn short_keywords_still_match_as_words() {
        let classifier = FailureClassifier::default();
        let cases = [
            ("worker OOM killed by the kernel", FailureKind::Memory),
            ("container status: OOMKilled", FailureKind::Memory),
            ("dns lookup failed for api.example.com", FailureKind::Network),
            ("Invalid argument: plan_id", FailureKind::InvalidInput),
        ];
        for (evidence, kind) in cases {
            assert_eq!(classifier.classify(evidence).failure_type, kind, "evidence: {evidence}");
        }
    }

    #[test]
    fn keyword_matcher_modes() {
        let loose = KeywordMatcher::new(["oom"]);
        let strict = KeywordMatcher::whole_words(["oom"]);
        assert!(loose.matches("zoom"));
        assert!(!strict.matches("zoom"));
        assert!(strict.matches("oom: killed"));
        assert!(strict.matches("oom"));
    }

    #[test]
    fn custom_signature_extends_without_touching_dispatch() {
        let classifier = FailureClassifier::default().with_signature(FailureSignature::new(
            FailureKind::Other("disk_full".into()),
            |e: &str| e.contains("no space left"),
            0.8,
            "Free disk space",
        ));
        let cause = classifier.classify("OSError: No space left on device");
        assert_eq!(cause.failure_type.as_str(), "disk_full");
        assert_eq!(
            serde_json::to_string(&cause.failure_type).unwrap(),
            "\"disk_full\""
        );
    }

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&FailureKind::InvalidInput).unwrap(),
            "\"invalid_input\""
        );
        let parsed: FailureKind = serde_json::from_str("\"rate_limit\"").unwrap();
        assert_eq!(parsed, FailureKind::RateLimit);
    }
}
