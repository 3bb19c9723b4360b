//! Regex rule engine deciding which documents get ingested.
//!
//! Rules come in two tiers: exclusion rules drop a document outright, and
//! inclusion rules (when any are configured) require at least one match.
//! Exclusion always wins over inclusion. Rule lists are treated as immutable
//! configuration: they are compiled once per [`apply_rules`] invocation, and a
//! pattern that fails to compile is kept as an explicit invalid marker that
//! never matches instead of aborting the pass.

use crate::document::Document;
use regex::Regex;

/// One pattern from a rule list together with its compile outcome.
#[derive(Debug)]
pub enum CompiledRule {
    /// Pattern compiled successfully and participates in matching.
    Usable(Regex),
    /// Pattern failed to compile; it is logged and never matches anything.
    Invalid {
        /// The pattern text as configured.
        pattern: String,
        /// The compiler's diagnostic.
        error: String,
    },
}

/// An immutable, compiled rule list (one tier: inclusion or exclusion).
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile every pattern, downgrading invalid ones to [`CompiledRule::Invalid`].
    pub fn compile(patterns: &[String]) -> Self {
        let rules = patterns
            .iter()
            .map(|pattern| match Regex::new(pattern) {
                Ok(regex) => CompiledRule::Usable(regex),
                Err(error) => {
                    tracing::warn!(
                        pattern = %pattern,
                        error = %error,
                        "Ignoring rule pattern that failed to compile"
                    );
                    CompiledRule::Invalid {
                        pattern: pattern.clone(),
                        error: error.to_string(),
                    }
                }
            })
            .collect();
        Self { rules }
    }

    /// Whether any usable rule matches the path (unanchored search, not full-match).
    pub fn matches(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            CompiledRule::Usable(regex) => regex.is_match(path),
            CompiledRule::Invalid { .. } => false,
        })
    }

    /// True when the set contains no usable rules. An inclusion tier in this
    /// state imposes no constraint (default-permit).
    pub fn is_effectively_empty(&self) -> bool {
        !self
            .rules
            .iter()
            .any(|rule| matches!(rule, CompiledRule::Usable(_)))
    }
}

/// Partition documents into kept and dropped according to the rule tiers.
///
/// Per document, evaluated against `metadata.file_path`:
/// 1. any exclusion match drops the document;
/// 2. otherwise, a non-empty inclusion tier drops documents that match none
///    of its rules;
/// 3. otherwise the document is kept.
///
/// The relative order of kept documents is preserved and documents are never
/// mutated, so re-applying the same rules to the output is a no-op.
pub fn apply_rules(
    documents: Vec<Document>,
    inclusion_rules: &[String],
    exclusion_rules: &[String],
) -> Vec<Document> {
    let exclude = RuleSet::compile(exclusion_rules);
    let include = RuleSet::compile(inclusion_rules);
    let loaded = documents.len();

    let mut kept = Vec::with_capacity(documents.len());
    for document in documents {
        let path = document.metadata.file_path.as_str();
        if exclude.matches(path) {
            tracing::debug!(file_path = %path, "Document excluded by rule");
            continue;
        }
        if !include.is_effectively_empty() && !include.matches(path) {
            tracing::debug!(file_path = %path, "Document matched no inclusion rule");
            continue;
        }
        tracing::debug!(file_path = %path, "Document kept");
        kept.push(document);
    }

    tracing::info!(
        loaded,
        kept = kept.len(),
        dropped = loaded - kept.len(),
        "Applied filter rules"
    );
    kept
}
