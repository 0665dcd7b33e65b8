//! Query routing

mod classifier;

pub use classifier::{
    classify, ClassificationResult, KeywordSet, QueryClassifier, DEFAULT_EMPLOYEE_KEYWORDS,
    DEFAULT_POLICY_KEYWORDS,
};
