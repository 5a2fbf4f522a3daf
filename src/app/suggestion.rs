//! Journal-account auto-suggestion: rank a tenant's accounts by how
//! closely their historical line memos match the remark being typed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Thresholds and limits for the suggester.
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Minimum similarity for a historical memo to be considered at all.
    pub consider_threshold: f64,
    /// Score at which a suggestion is safe to pre-fill without review.
    pub auto_apply_threshold: f64,
    /// Maximum number of ranked suggestions returned.
    pub max_results: usize,
    /// How many recent memos the storage layer feeds the suggester.
    pub corpus_limit: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            consider_threshold: 0.3,
            auto_apply_threshold: 0.8,
            max_results: 5,
            corpus_limit: 500,
        }
    }
}

/// One historical journal line fed into the suggester.
#[derive(Debug, Clone)]
pub struct MemoRecord {
    pub account_code: String,
    pub memo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSuggestion {
    pub account_code: String,
    pub account_name: String,
    /// Best similarity between the query remark and this account's memos.
    pub score: f64,
    /// The historical memo that produced the best score.
    pub matched_memo: String,
    /// How many of the account's memos cleared the consideration threshold.
    pub occurrences: usize,
    pub auto_apply: bool,
}

pub struct AccountSuggester {
    config: SuggestionConfig,
}

impl Default for AccountSuggester {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountSuggester {
    pub fn new() -> Self {
        Self {
            config: SuggestionConfig::default(),
        }
    }

    pub fn with_config(config: SuggestionConfig) -> Self {
        Self { config }
    }

    pub fn corpus_limit(&self) -> usize {
        self.config.corpus_limit
    }

    /// Rank accounts for `remark` against the historical memos.
    /// `account_names` maps code to display name; unknown codes fall back
    /// to the code itself.
    pub fn suggest(
        &self,
        remark: &str,
        history: &[MemoRecord],
        account_names: &HashMap<String, String>,
    ) -> Vec<AccountSuggestion> {
        let query = normalize_remark(remark);
        if query.is_empty() {
            return Vec::new();
        }

        // Per account: best score, the memo that produced it, and how many
        // memos cleared the consideration threshold.
        let mut best: HashMap<&str, (f64, &str, usize)> = HashMap::new();
        for record in history {
            let score = text_similarity(&query, &normalize_remark(&record.memo));
            if score < self.config.consider_threshold {
                continue;
            }

            let entry = best
                .entry(record.account_code.as_str())
                .or_insert((score, record.memo.as_str(), 0));
            entry.2 += 1;
            if score > entry.0 {
                entry.0 = score;
                entry.1 = record.memo.as_str();
            }
        }

        let mut suggestions: Vec<AccountSuggestion> = best
            .into_iter()
            .map(|(code, (score, memo, occurrences))| AccountSuggestion {
                account_code: code.to_string(),
                account_name: account_names
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| code.to_string()),
                score,
                matched_memo: memo.to_string(),
                occurrences,
                auto_apply: score >= self.config.auto_apply_threshold,
            })
            .collect();

        // Highest score first; occurrence count breaks ties.
        suggestions.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.occurrences.cmp(&a.occurrences))
        });
        suggestions.truncate(self.config.max_results);
        suggestions
    }
}

/// Lowercase, fold punctuation to spaces, collapse whitespace.
fn normalize_remark(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Token-set Jaccard similarity over normalized text.
fn text_similarity(normalized1: &str, normalized2: &str) -> f64 {
    if normalized1 == normalized2 {
        return 1.0;
    }

    let tokens1: std::collections::HashSet<&str> = normalized1.split_whitespace().collect();
    let tokens2: std::collections::HashSet<&str> = normalized2.split_whitespace().collect();

    if tokens1.is_empty() || tokens2.is_empty() {
        return 0.0;
    }

    let intersection = tokens1.intersection(&tokens2).count();
    let union = tokens1.union(&tokens2).count();

    intersection as f64 / union as f64
}
