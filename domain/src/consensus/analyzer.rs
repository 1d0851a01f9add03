//! Lexical-overlap consensus analyzer.

use crate::provider::{ProviderId, ProviderResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Maximum number of keywords reported.
const MAX_KEYWORDS: usize = 5;
/// Words must be strictly longer than this many characters.
const MIN_WORD_CHARS: usize = 3;

pub const NO_VALID_RESPONSES: &str = "no valid responses";
pub const MULTIPLE_PERSPECTIVES: &str = "multiple provider perspectives available";

/// Confidence in a consensus summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::None => write!(f, "none"),
            Confidence::Low => write!(f, "low"),
            Confidence::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSummary {
    pub conclusion: String,
    pub confidence: Confidence,
    pub common_keywords: Vec<String>,
    /// Providers whose answers were compared
    pub providers: Vec<ProviderId>,
}

/// Compare the successful results' final texts.
///
/// - no successful result: conclusion `"no valid responses"`
/// - one: low confidence, naming that provider
/// - two or more: words longer than three characters that occur in at least
///   two providers' answers (case-insensitive), ranked by total frequency
///   (ties alphabetical), top five, confidence high
///
/// Deterministic for identical input.
pub fn analyze(results: &[ProviderResult]) -> ConsensusSummary {
    let successful: Vec<&ProviderResult> = results.iter().filter(|r| r.is_success()).collect();
    let providers = successful.iter().map(|r| r.provider).collect();

    match successful.as_slice() {
        [] => ConsensusSummary {
            conclusion: NO_VALID_RESPONSES.to_string(),
            confidence: Confidence::None,
            common_keywords: Vec::new(),
            providers,
        },
        [only] => ConsensusSummary {
            conclusion: format!("single response from {}", only.provider.display_name()),
            confidence: Confidence::Low,
            common_keywords: Vec::new(),
            providers,
        },
        many => ConsensusSummary {
            conclusion: MULTIPLE_PERSPECTIVES.to_string(),
            confidence: Confidence::High,
            common_keywords: common_keywords(many.iter().map(|r| r.text())),
            providers,
        },
    }
}

fn common_keywords<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<String> {
    // word -> (total occurrences, answers containing it)
    let mut stats: HashMap<String, (usize, BTreeSet<usize>)> = HashMap::new();
    for (index, text) in texts.enumerate() {
        for word in words(text) {
            let entry = stats.entry(word).or_default();
            entry.0 += 1;
            entry.1.insert(index);
        }
    }

    let mut shared: Vec<(String, usize)> = stats
        .into_iter()
        .filter(|(_, (_, answers))| answers.len() > 1)
        .map(|(word, (count, _))| (word, count))
        .collect();
    shared.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    shared
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _)| word)
        .collect()
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > MIN_WORD_CHARS)
        .map(str::to_lowercase)
}
