//! Reconciliation engine: one reviewer call per page.

use std::sync::Arc;

use tracing::{debug, warn};

use super::prompt::build_prompt;
use super::response::parse_response;
use crate::llm::{ReviewError, Reviewer, ReviewerConfig};
use crate::models::{CanonicalRecord, MergedPageRecord};

/// Turns merged pages into canonical records through a [`Reviewer`].
///
/// Model selection is round-robin over `models`, driven by a call counter
/// owned by the engine instance.
pub struct ReconciliationEngine {
    reviewer: Arc<dyn Reviewer>,
    models: Vec<String>,
    template: String,
    call_count: u64,
}

impl ReconciliationEngine {
    pub fn new(
        reviewer: Arc<dyn Reviewer>,
        models: Vec<String>,
        template: impl Into<String>,
    ) -> Result<Self, ReviewError> {
        if models.is_empty() {
            return Err(ReviewError::NotConfigured(
                "no reviewer models configured".to_string(),
            ));
        }
        Ok(Self {
            reviewer,
            models,
            template: template.into(),
            call_count: 0,
        })
    }

    /// Engine using the models and prompt template from `config`.
    pub fn from_config(
        reviewer: Arc<dyn Reviewer>,
        config: &ReviewerConfig,
    ) -> Result<Self, ReviewError> {
        Self::new(reviewer, config.models(), config.get_prompt())
    }

    /// Number of reviewer calls made so far.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Pick the model for the next call and advance the counter.
    fn next_model(&mut self) -> String {
        let model = self.models[(self.call_count % self.models.len() as u64) as usize].clone();
        self.call_count += 1;
        model
    }

    /// Reconcile one page.
    ///
    /// Never fails: reviewer and parse errors become a failure record
    /// carrying only the identity and the error description.
    pub async fn reconcile(&mut self, page: &MergedPageRecord) -> CanonicalRecord {
        let model = self.next_model();
        let prompt = build_prompt(&self.template, &page.variants);
        debug!(
            "{}: reviewing with {} ({})",
            page.identity,
            model,
            self.reviewer.provider_name()
        );

        let result = match self.reviewer.review(&model, &prompt).await {
            Ok(body) => parse_response(&body),
            Err(e) => Err(e),
        };

        match result {
            Ok(reviewed) => CanonicalRecord::success(
                page.identity.clone(),
                reviewed.clean_text,
                reviewed.doc_type,
                reviewed.subject,
                reviewed.entities,
            ),
            Err(e) => {
                warn!("{}: reviewer failed ({}): {}", page.identity, model, e);
                CanonicalRecord::failure(page.identity.clone(), format!("{}: {}", model, e))
            }
        }
    }
}
