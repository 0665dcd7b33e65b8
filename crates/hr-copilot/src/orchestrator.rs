//! Top-level question answering: route, gather context, generate, cite

use std::sync::Arc;
use std::time::Duration;

use crate::config::RetrievalConfig;
use crate::employee::{build_employee_context, EmployeeLookup};
use crate::error::{Error, Result};
use crate::generation::{append_citation_block, PromptBuilder};
use crate::providers::{bounded, LlmProvider};
use crate::retrieval::Retriever;
use crate::routing::{ClassificationResult, QueryClassifier};
use crate::types::{ChatMessage, ChatResponse};

/// Answer given when policy context is needed but no index is loaded
pub const LOAD_DOCUMENTS_MESSAGE: &str = "I don't have any policy documents loaded yet. \
Please load the policy documents first and then ask your question again.";

/// Coordinates classification, context gathering and generation
pub struct Orchestrator {
    classifier: QueryClassifier,
    retriever: Retriever,
    employees: Arc<dyn EmployeeLookup>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
    threshold: f32,
    llm_timeout: Duration,
}

/// Policy context ready for the prompt
struct PolicyContext {
    text: String,
    sources: Vec<String>,
}

impl Orchestrator {
    pub fn new(
        classifier: QueryClassifier,
        retriever: Retriever,
        employees: Arc<dyn EmployeeLookup>,
        llm: Arc<dyn LlmProvider>,
        retrieval: &RetrievalConfig,
        llm_timeout: Duration,
    ) -> Self {
        Self {
            classifier,
            retriever,
            employees,
            llm,
            top_k: retrieval.top_k,
            threshold: retrieval.similarity_threshold,
            llm_timeout,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `query`, never failing: errors become an apology with `success = false`
    pub async fn generate_response(
        &self,
        query: &str,
        emp_id: Option<&str>,
        history: &[ChatMessage],
    ) -> ChatResponse {
        let classification = self.classifier.classify(query);

        match self.answer(query, emp_id, history, classification).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_provider_failure() {
                    tracing::warn!("Provider unavailable while answering: {}", e);
                } else {
                    tracing::error!("Error generating response: {}", e);
                }
                ChatResponse::failure(e.user_message(), classification)
            }
        }
    }

    async fn answer(
        &self,
        query: &str,
        emp_id: Option<&str>,
        history: &[ChatMessage],
        classification: ClassificationResult,
    ) -> Result<ChatResponse> {
        let emp_id = emp_id.map(str::trim).filter(|id| !id.is_empty());

        let employee = async {
            match emp_id {
                Some(id) if classification.needs_employee_data => {
                    Some(build_employee_context(self.employees.as_ref(), id, query))
                }
                _ => None,
            }
        };
        let policy = async {
            if classification.needs_policy_data {
                Some(self.policy_context(query).await)
            } else {
                None
            }
        };
        let (employee_context, policy) = tokio::join!(employee, policy);

        let policy = match policy.transpose() {
            Ok(policy) => policy.flatten(),
            Err(Error::IndexNotReady) => {
                tracing::info!("Policy context requested before any documents were loaded");
                return Ok(ChatResponse {
                    answer: LOAD_DOCUMENTS_MESSAGE.to_string(),
                    sources: Vec::new(),
                    classification,
                    success: true,
                });
            }
            Err(e) => return Err(e),
        };

        let prompt = PromptBuilder::assemble(
            employee_context.as_deref(),
            policy.as_ref().map(|p| p.text.as_str()),
            history,
            query,
        );

        let answer = bounded("generation", self.llm_timeout, self.llm.complete(&prompt)).await?;
        let sources = policy.map(|p| p.sources).unwrap_or_default();

        tracing::info!(
            "Answered query with {} ({} sources)",
            self.llm.model(),
            sources.len()
        );

        Ok(ChatResponse {
            answer: append_citation_block(&answer, &sources),
            sources,
            classification,
            success: true,
        })
    }

    /// Retrieved policy context, or `None` when nothing passed the threshold
    async fn policy_context(&self, query: &str) -> Result<Option<PolicyContext>> {
        let results = self
            .retriever
            .retrieve(query, self.top_k, self.threshold)
            .await?;
        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(PolicyContext {
            text: Retriever::format_context(&results),
            sources: Retriever::get_sources(&results),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::employee::CsvEmployeeStore;
    use crate::index::{DistanceMetric, IndexStore};
    use crate::providers::{EmbeddingProvider, HashEmbedder};
    use crate::routing::KeywordSet;
    use crate::types::Chunk;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records prompts and replies with a fixed answer or error
    struct ScriptedLlm {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            self.reply.clone().map_err(Error::provider)
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }
    }

    fn empty_store() -> IndexStore {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder::new(1024).unwrap());
        IndexStore::new(embedder, DistanceMetric::Cosine, 16, Duration::from_secs(5))
    }

    fn orchestrator(store: IndexStore, llm: Arc<ScriptedLlm>) -> Orchestrator {
        let classifier = QueryClassifier::new(
            KeywordSet::new(["my", "balance", "manager"]),
            KeywordSet::new(["policy", "maternity"]),
        );
        Orchestrator::new(
            classifier,
            Retriever::new(store, Duration::from_secs(5)),
            Arc::new(CsvEmployeeStore::default()),
            llm,
            &RetrievalConfig::default(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_not_ready_skips_generation() {
        let llm = ScriptedLlm::answering("unused");
        let orchestrator = orchestrator(empty_store(), llm.clone());

        let response = orchestrator
            .generate_response("what is the maternity policy", None, &[])
            .await;

        assert!(response.success);
        assert_eq!(response.answer, LOAD_DOCUMENTS_MESSAGE);
        assert!(response.sources.is_empty());
        assert!(llm.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_contained() {
        let store = empty_store();
        store
            .build(vec![Chunk::new("m.txt", "maternity policy".into(), 0, 0, 16)])
            .await
            .unwrap();
        let orchestrator = orchestrator(store, ScriptedLlm::failing("HTTP 500 secret-token"));

        let response = orchestrator
            .generate_response("maternity policy", None, &[])
            .await;

        assert!(!response.success);
        assert!(response.sources.is_empty());
        assert!(response.answer.starts_with("I apologize"));
        assert!(!response.answer.contains("secret-token"));
        assert!(response.classification.needs_policy_data);
    }

    #[tokio::test]
    async fn test_no_hits_means_no_citation() {
        let store = empty_store();
        store
            .build(vec![Chunk::new("travel.txt", "mileage reimbursement".into(), 0, 0, 21)])
            .await
            .unwrap();
        let llm = ScriptedLlm::answering("Please contact HR.");
        let orchestrator = orchestrator(store, llm.clone());

        let response = orchestrator
            .generate_response("maternity policy", None, &[])
            .await;

        assert!(response.success);
        assert_eq!(response.answer, "Please contact HR.");
        assert!(response.sources.is_empty());
        assert!(!llm.prompts.lock()[0].contains("Relevant Policy Information:"));
    }

    #[tokio::test]
    async fn test_employee_only_query_without_index() {
        let llm = ScriptedLlm::answering("You have 0 days.");
        let orchestrator = orchestrator(empty_store(), llm.clone());

        let response = orchestrator
            .generate_response("what is my balance", Some("E404"), &[])
            .await;

        assert!(response.success);
        assert!(!response.classification.needs_policy_data);
        assert!(llm.prompts.lock()[0].contains("Employee ID E404 not found in the system."));
    }
}
