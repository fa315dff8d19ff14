//! # Turn Orchestrator
//!
//! Drives one conversation turn end to end:
//! 1. Assemble the context (history + new message) and extract entity
//!    mentions across it
//! 2. Validate the caller-supplied penalty state against the option set,
//!    reinitializing on absence or shape mismatch
//! 3. Hand the turn to the backbone: generate, arbitrate, finalize
//! 4. Return the reply text and the updated penalty state
//!
//! The orchestrator holds no per-conversation memory: the turn history and
//! the penalty state live with the caller and are passed in every call, so
//! independent conversations can run concurrently as long as each owns its
//! own state.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};

use backbone::{Backbone, BackboneConfig, BackboneKind};
use catalog::{EntityCatalog, EntityExtractor};
use dialogue::{ConversationContext, OptionSet, PenaltyState, Turn};
use model_client::{ModelClient, ModelRuntime};

/// The caller-facing entry point of the recommender core.
pub struct TurnOrchestrator {
    extractor: EntityExtractor,
    backbone: Backbone,
    options: OptionSet,
}

impl TurnOrchestrator {
    /// Build an orchestrator from already-constructed parts.
    ///
    /// An unknown model name is a fatal configuration error; nothing is
    /// constructed in that case.
    pub fn from_components(
        catalog: Arc<EntityCatalog>,
        runtime: Arc<dyn ModelRuntime>,
        model_name: &str,
        options: OptionSet,
        config: BackboneConfig,
    ) -> Result<Self> {
        let kind: BackboneKind = model_name.parse()?;
        let extractor = EntityExtractor::new(&catalog);
        let backbone = Backbone::new(kind, catalog, runtime, config);
        info!("Constructed {} backbone with {} options", kind, options.len());
        Ok(Self {
            extractor,
            backbone,
            options,
        })
    }

    /// Load the entity catalog, connect to the model-inference service and
    /// build the backbone named by `model_name`.
    ///
    /// # Arguments
    /// * `model_name` - backbone selector, e.g. "barcor_redial"
    /// * `data_dir` - dataset directory with the entity tables
    /// * `model_addr` - address of the inference service
    pub async fn connect(
        model_name: &str,
        data_dir: &Path,
        model_addr: impl Into<String>,
        config: BackboneConfig,
    ) -> Result<Self> {
        let catalog = Arc::new(
            EntityCatalog::load_from_dir(data_dir).context("loading entity catalog")?,
        );
        let client = ModelClient::connect(model_addr).await?;
        Self::from_components(
            catalog,
            Arc::new(client),
            model_name,
            OptionSet::builtin(),
            config,
        )
    }

    /// Replace the option set (the last option stays the recommend slot).
    pub fn with_options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Generate a reply to the user input.
    ///
    /// # Arguments
    /// * `input_message` - the new user message
    /// * `history` - prior turns, oldest first, blanks included
    /// * `state` - the penalty state returned by the previous call, if any
    ///
    /// # Returns
    /// The reply text and the updated penalty state, which the caller
    /// stores and passes back on the next turn.
    pub async fn reply(
        &self,
        input_message: &str,
        history: &[Turn],
        state: Option<PenaltyState>,
    ) -> Result<(String, PenaltyState)> {
        let start = Instant::now();

        let mut context = ConversationContext::from_turns(history, input_message);
        context.mentions = self.extractor.extract_all(&context.utterances);
        info!(
            "Built context: {} utterances, {} entity mentions",
            context.utterances.len(),
            context.mentions.len()
        );

        // An absent or mis-shaped state vector is reset, never an error.
        let state = match state {
            Some(s) if s.matches(self.options.len()) => s,
            Some(s) => {
                debug!(
                    "Penalty state of length {} does not match {} options, reinitializing",
                    s.len(),
                    self.options.len()
                );
                PenaltyState::fresh(self.options.len())
            }
            None => PenaltyState::fresh(self.options.len()),
        };

        let (response, state) = self
            .backbone
            .respond(&context, &self.options, state)
            .await
            .context("generating turn response")?;

        info!("Turn finished in {:.2?}", start.elapsed());
        Ok((response, state))
    }
}
