use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MAX_MESSAGE_CHARS: usize = 200;

static ERROR_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*((?:[A-Za-z_][\w.]*(?:Error|Exception)|Error|error)\b:?\s*.*)$").ok()
});
static LINE_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bline\s+(\d+)").ok());
static FILE_COLON_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\w./\\-]+\.[A-Za-z]{1,4}:(\d+)").ok());
static QUOTED_FILE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"File "([^"]+)""#).ok());
static SOURCE_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"([\w./\\-]+\.(?:py|rs|js|ts|go|java|rb|c|cc|cpp|h|hpp))\b").ok()
});

/// What could be recovered from raw failure evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

pub(super) fn extract_details(evidence: &str) -> FailureDetails {
    FailureDetails {
        error_message: error_message(evidence),
        line_number: line_number(evidence),
        file_name: file_name(evidence),
    }
}

/// Last `SomethingError: ...` line, else the first non-empty line.
fn error_message(evidence: &str) -> String {
    let from_error_line = ERROR_LINE.as_ref().and_then(|re| {
        evidence
            .lines()
            .rev()
            .find_map(|line| re.captures(line).map(|c| c[1].trim().to_string()))
    });
    let message = from_error_line.unwrap_or_else(|| {
        evidence
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string()
    });
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}

fn line_number(evidence: &str) -> Option<u32> {
    [&*LINE_NUMBER, &*FILE_COLON_LINE]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(evidence).and_then(|c| c[1].parse().ok()))
}

fn file_name(evidence: &str) -> Option<String> {
    [&*QUOTED_FILE, &*SOURCE_PATH]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(evidence).map(|c| c[1].to_string()))
}
