// src/core/classifier.rs

use std::fmt;

/// What a failed provider call says about the key that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Credential rejected. The key is revoked.
    Auth,
    /// Rate limit or quota exhausted. Exponential cooldown.
    Quota,
    /// Anything else: timeouts, 5xx, connection resets. Flat cooldown.
    Generic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// A single classification rule.
pub trait FailureClassifier: Send + Sync {
    /// Examines a lowercased error message.
    ///
    /// # Returns
    /// * `Some(kind)` if this classifier recognises the message.
    /// * `None` to let the next classifier in the chain try.
    fn classify(&self, message: &str) -> Option<FailureKind>;
}

fn contains_any(message: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| message.contains(n))
}

pub struct AuthFailureClassifier;

impl FailureClassifier for AuthFailureClassifier {
    fn classify(&self, message: &str) -> Option<FailureKind> {
        contains_any(message, &["401", "403"]).then_some(FailureKind::Auth)
    }
}

pub struct QuotaFailureClassifier;

impl FailureClassifier for QuotaFailureClassifier {
    fn classify(&self, message: &str) -> Option<FailureKind> {
        contains_any(message, &["429", "quota"]).then_some(FailureKind::Quota)
    }
}

/// Matches any of a caller-supplied set of substrings.
pub struct SubstringClassifier {
    needles: Vec<String>,
    kind: FailureKind,
}

impl SubstringClassifier {
    pub fn new<I, S>(kind: FailureKind, needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            needles: needles
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
            kind,
        }
    }
}

impl FailureClassifier for SubstringClassifier {
    fn classify(&self, message: &str) -> Option<FailureKind> {
        self.needles
            .iter()
            .any(|n| message.contains(n.as_str()))
            .then_some(self.kind)
    }
}

/// Ordered list of classifiers; the first match wins, `Generic` otherwise.
pub struct ClassifierChain {
    classifiers: Vec<Box<dyn FailureClassifier>>,
}

impl ClassifierChain {
    pub fn empty() -> Self {
        Self {
            classifiers: Vec::new(),
        }
    }

    /// Append a classifier after the existing ones.
    pub fn with(mut self, classifier: Box<dyn FailureClassifier>) -> Self {
        self.classifiers.push(classifier);
        self
    }

    /// Insert a classifier ahead of the existing ones.
    pub fn with_first(mut self, classifier: Box<dyn FailureClassifier>) -> Self {
        self.classifiers.insert(0, classifier);
        self
    }

    pub fn classify_message(&self, error_message: Option<&str>) -> FailureKind {
        let Some(message) = error_message else {
            return FailureKind::Generic;
        };
        let message = message.to_lowercase();
        self.classifiers
            .iter()
            .find_map(|c| c.classify(&message))
            .unwrap_or(FailureKind::Generic)
    }
}

impl Default for ClassifierChain {
    fn default() -> Self {
        Self::empty()
            .with(Box::new(AuthFailureClassifier))
            .with(Box::new(QuotaFailureClassifier))
    }
}

impl fmt::Debug for ClassifierChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierChain")
            .field("classifiers", &self.classifiers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("HTTP 401 Unauthorized", FailureKind::Auth)]
    #[case("403 Forbidden: API key not valid", FailureKind::Auth)]
    #[case("429 rate limited", FailureKind::Quota)]
    #[case("Resource has been exhausted (e.g. check QUOTA).", FailureKind::Quota)]
    #[case("request timed out", FailureKind::Generic)]
    #[case("502 Bad Gateway", FailureKind::Generic)]
    #[case("", FailureKind::Generic)]
    fn default_chain_classification(#[case] message: &str, #[case] expected: FailureKind) {
        let chain = ClassifierChain::default();
        assert_eq!(chain.classify_message(Some(message)), expected);
    }

    #[test]
    fn missing_message_is_generic() {
        assert_eq!(
            ClassifierChain::default().classify_message(None),
            FailureKind::Generic
        );
    }

    #[test]
    fn auth_wins_over_quota() {
        let chain = ClassifierChain::default();
        assert_eq!(
            chain.classify_message(Some("403 after 429 retries")),
            FailureKind::Auth
        );
    }

    #[test]
    fn custom_classifier_extends_taxonomy() {
        let chain = ClassifierChain::default().with(Box::new(SubstringClassifier::new(
            FailureKind::Quota,
            ["RESOURCE_EXHAUSTED"],
        )));
        assert_eq!(
            chain.classify_message(Some("status: resource_exhausted")),
            FailureKind::Quota
        );
    }

    #[test]
    fn prepended_classifier_takes_precedence() {
        let chain = ClassifierChain::default().with_first(Box::new(SubstringClassifier::new(
            FailureKind::Generic,
            ["401 from proxy"],
        )));
        assert_eq!(
            chain.classify_message(Some("401 from proxy, upstream fine")),
            FailureKind::Generic
        );
    }
}
