//! Race classification policy
//!
//! Decides, per operation kind, whether a store failure is an expected race
//! (`Benign`) or a correctness failure (`Fatal`). The benign set is kept
//! deliberately small: anything not listed here is a finding.

use std::fmt;

use crate::store::StoreError;

/// MySQL `ER_DUP_ENTRY`.
pub const ER_DUP_ENTRY: u16 = 1062;

/// The DML statement that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Insert => write!(f, "insert"),
            OperationKind::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Benign,
    Fatal,
}

/// One way of recognizing a store error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// Exact server error code.
    Code(u16),
    /// Every fragment appears in the message (ASCII case-insensitive).
    MessageContains(Vec<String>),
}

impl Signature {
    pub fn message_contains<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Signature::MessageContains(
            fragments
                .into_iter()
                .map(|s| s.into().to_ascii_lowercase())
                .collect(),
        )
    }

    pub fn matches(&self, err: &StoreError) -> bool {
        match self {
            Signature::Code(code) => err.code == Some(*code),
            Signature::MessageContains(fragments) => {
                let message = err.message.to_ascii_lowercase();
                !fragments.is_empty() && fragments.iter().all(|f| message.contains(f.as_str()))
            }
        }
    }
}

/// A benign signature scoped to one operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenignRule {
    pub operation: OperationKind,
    pub signature: Signature,
    /// Short name used in logs and counters.
    pub label: &'static str,
}

/// Ordered table of benign rules; the first match wins, no match is fatal.
#[derive(Debug, Clone, Default)]
pub struct ErrorClassifier {
    rules: Vec<BenignRule>,
}

impl ErrorClassifier {
    /// Classifier with no benign rules: every failure is fatal.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(
        mut self,
        operation: OperationKind,
        label: &'static str,
        signature: Signature,
    ) -> Self {
        self.rules.push(BenignRule {
            operation,
            signature,
            label,
        });
        self
    }

    /// Table for TiDB and other MySQL-protocol stores.
    ///
    /// Insert: unique-key violation. Delete: TiDB's
    /// `Error 8028 (HY000): public column val0 has changed`.
    pub fn tidb() -> Self {
        Self::new()
            .with_rule(OperationKind::Insert, "duplicate_key", Signature::Code(ER_DUP_ENTRY))
            .with_rule(
                OperationKind::Insert,
                "duplicate_key",
                Signature::message_contains(["duplicate entry"]),
            )
            .with_rule(
                OperationKind::Delete,
                "column_changed",
                Signature::message_contains(["public column", "has changed"]),
            )
    }

    pub fn rules(&self) -> &[BenignRule] {
        &self.rules
    }

    /// The benign rule matching `err` on `operation`, if any.
    pub fn matching_rule(&self, err: &StoreError, operation: OperationKind) -> Option<&BenignRule> {
        self.rules
            .iter()
            .find(|rule| rule.operation == operation && rule.signature.matches(err))
    }

    pub fn classify(&self, err: &StoreError, operation: OperationKind) -> Classification {
        if self.matching_rule(err, operation).is_some() {
            Classification::Benign
        } else {
            Classification::Fatal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duplicate() -> StoreError {
        StoreError::server(ER_DUP_ENTRY, "23000", "Duplicate entry '12' for key 'rows.idx_val0'")
    }

    fn column_changed() -> StoreError {
        StoreError::server(8028, "HY000", "public column val0 has changed")
    }

    #[test]
    fn test_duplicate_key_is_benign_only_on_insert() {
        let classifier = ErrorClassifier::tidb();
        assert_eq!(classifier.classify(&duplicate(), OperationKind::Insert), Classification::Benign);
        assert_eq!(classifier.classify(&duplicate(), OperationKind::Delete), Classification::Fatal);
    }

    #[test]
    fn test_column_changed_is_benign_only_on_delete() {
        let classifier = ErrorClassifier::tidb();
        assert_eq!(
            classifier.classify(&column_changed(), OperationKind::Delete),
            Classification::Benign
        );
        assert_eq!(
            classifier.classify(&column_changed(), OperationKind::Insert),
            Classification::Fatal
        );
    }

    #[test]
    fn test_duplicate_matched_by_message_without_code() {
        let classifier = ErrorClassifier::tidb();
        let err = StoreError::client("Duplicate entry '3' for key 'PRIMARY'");
        assert_eq!(classifier.classify(&err, OperationKind::Insert), Classification::Benign);
    }

    #[test]
    fn test_partial_shape_change_message_is_fatal() {
        let classifier = ErrorClassifier::tidb();
        // Same code, different condition: must not be swallowed.
        let err = StoreError::server(8028, "HY000", "Information schema is changed during the execution of the statement");
        assert_eq!(classifier.classify(&err, OperationKind::Delete), Classification::Fatal);

        let err = StoreError::server(1105, "HY000", "column has changed type");
        assert_eq!(classifier.classify(&err, OperationKind::Delete), Classification::Fatal);
    }

    #[test]
    fn test_unknown_errors_are_fatal() {
        let classifier = ErrorClassifier::tidb();
        let err = StoreError::timeout(std::time::Duration::from_secs(30));
        assert_eq!(classifier.classify(&err, OperationKind::Insert), Classification::Fatal);
        assert_eq!(classifier.classify(&err, OperationKind::Delete), Classification::Fatal);
    }

    #[test]
    fn test_empty_classifier_has_no_benign_set() {
        let classifier = ErrorClassifier::new();
        assert_eq!(classifier.classify(&duplicate(), OperationKind::Insert), Classification::Fatal);
        assert!(classifier.rules().is_empty());
    }

    #[test]
    fn test_matching_rule_reports_label() {
        let classifier = ErrorClassifier::tidb();
        let rule = classifier
            .matching_rule(&column_changed(), OperationKind::Delete)
            .expect("rule");
        assert_eq!(rule.label, "column_changed");
    }

    #[test]
    fn test_custom_table() {
        let classifier = ErrorClassifier::new().with_rule(
            OperationKind::Delete,
            "serialization_failure",
            Signature::Code(40001),
        );
        let err = StoreError::server(40001, "40001", "could not serialize access");
        assert_eq!(classifier.classify(&err, OperationKind::Delete), Classification::Benign);
        assert_eq!(classifier.classify(&err, OperationKind::Insert), Classification::Fatal);
    }
}
