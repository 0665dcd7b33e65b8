//! Lexical query routing between employee records and policy documents

use serde::{Deserialize, Serialize};

use crate::config::RoutingConfig;

/// Phrases that indicate a question about the asking employee's own record
pub const DEFAULT_EMPLOYEE_KEYWORDS: &[&str] = &[
    "my",
    "i",
    "me",
    "balance",
    "manager",
    "leaves left",
    "my department",
    "my role",
    "my manager",
    "how many leaves",
    "contact",
    "who is",
    "when did i join",
    "my email",
    "my phone",
];

/// Phrases that indicate a question answered by policy documents
pub const DEFAULT_POLICY_KEYWORDS: &[&str] = &[
    "policy",
    "policies",
    "benefits",
    "maternity",
    "paternity",
    "onboarding",
    "handbook",
    "guide",
    "eligibility",
    "apply for",
    "procedure",
    "process",
    "rules",
    "regulations",
    "entitled",
    "sick leave policy",
    "casual leave",
    "earned leave",
    "how to",
];

/// Which knowledge sources a query needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub needs_employee_data: bool,
    pub needs_policy_data: bool,
    pub is_hybrid: bool,
}

impl ClassificationResult {
    fn new(employee: bool, policy: bool) -> Self {
        // Unmatched queries go to the policy documents
        let policy = policy || !employee;
        Self {
            needs_employee_data: employee,
            needs_policy_data: policy,
            is_hybrid: employee && policy,
        }
    }
}

/// A lower-cased keyword set matched by substring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn default_employee() -> Self {
        Self::new(DEFAULT_EMPLOYEE_KEYWORDS)
    }

    pub fn default_policy() -> Self {
        Self::new(DEFAULT_POLICY_KEYWORDS)
    }

    /// True if any keyword occurs in the already lower-cased text
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Classify `query` against the two keyword sets
pub fn classify(query: &str, employee: &KeywordSet, policy: &KeywordSet) -> ClassificationResult {
    let lowered = query.to_lowercase();
    ClassificationResult::new(employee.matches(&lowered), policy.matches(&lowered))
}

/// Query classifier holding its keyword sets
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    employee: KeywordSet,
    policy: KeywordSet,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(KeywordSet::default_employee(), KeywordSet::default_policy())
    }
}

impl QueryClassifier {
    pub fn new(employee: KeywordSet, policy: KeywordSet) -> Self {
        Self { employee, policy }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(
            KeywordSet::new(&config.employee_keywords),
            KeywordSet::new(&config.policy_keywords),
        )
    }

    pub fn classify(&self, query: &str) -> ClassificationResult {
        let result = classify(query, &self.employee, &self.policy);
        tracing::debug!(
            "Classified query: employee={} policy={} hybrid={}",
            result.needs_employee_data,
            result.needs_policy_data,
            result.is_hybrid
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_policy_query() {
        let classifier = QueryClassifier::new(
            KeywordSet::new(["my", "balance", "manager"]),
            KeywordSet::default_policy(),
        );
        let result = classifier.classify("What is the maternity leave policy?");
        assert!(result.needs_policy_data);
        assert!(!result.needs_employee_data);
        assert!(!result.is_hybrid);
    }

    #[test]
    fn test_employee_query() {
        let result = QueryClassifier::default().classify("Who is my MANAGER?");
        assert!(result.needs_employee_data);
        assert!(!result.needs_policy_data);
    }

    #[test]
    fn test_hybrid_query() {
        let result = QueryClassifier::default().classify("Am I entitled to paternity benefits?");
        assert!(result.needs_employee_data);
        assert!(result.needs_policy_data);
        assert!(result.is_hybrid);
    }

    #[test]
    fn test_no_match_defaults_to_policy() {
        let employee = KeywordSet::new(["balance"]);
        let policy = KeywordSet::new(["handbook"]);
        let result = classify("office timings", &employee, &policy);

        assert_eq!(
            result,
            ClassificationResult {
                needs_employee_data: false,
                needs_policy_data: true,
                is_hybrid: false,
            }
        );
    }

    #[test]
    fn test_substring_matching_is_literal() {
        // "i" is a default employee keyword and matches inside words
        let result = QueryClassifier::default().classify("office timings");
        assert!(result.needs_employee_data);
    }

    #[test]
    fn test_keywords_are_normalized() {
        let set = KeywordSet::new(["  Leave Balance ", ""]);
        assert_eq!(set.keywords(), &["leave balance".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_classification_is_deterministic(query in ".{0,80}") {
            let classifier = QueryClassifier::default();
            let first = classifier.classify(&query);
            prop_assert_eq!(first, classifier.classify(&query));
            prop_assert!(first.needs_employee_data || first.needs_policy_data);
            prop_assert_eq!(first.is_hybrid, first.needs_employee_data && first.needs_policy_data);
        }
    }
}
