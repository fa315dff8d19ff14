//! The BARCOR backbone: a BART sequence classifier for recommendation and
//! a BART seq2seq generator for dialogue, arbitrated per turn.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use catalog::{EntityCatalog, EntityId};
use dialogue::{ConversationContext, OptionSet, PenaltyState};
use model_client::ModelRuntime;

use crate::arbiter::ActionArbiter;
use crate::config::BackboneConfig;
use crate::generator::{GenerationInputs, ResponseGenerator};
use crate::scorer::RecommendationScorer;

const RECOMMENDATION_HEADER: &str = "I would recommend the following items:\n";

/// The per-turn capability bundle around the two BART heads.
pub struct BarcorBackbone {
    catalog: Arc<EntityCatalog>,
    scorer: RecommendationScorer,
    generator: ResponseGenerator,
    arbiter: ActionArbiter,
    rendered_recommendations: usize,
}

impl BarcorBackbone {
    pub fn new(
        catalog: Arc<EntityCatalog>,
        runtime: Arc<dyn ModelRuntime>,
        config: BackboneConfig,
    ) -> Self {
        let scorer = RecommendationScorer::new(catalog.clone(), runtime.clone(), config.clone());
        let generator = ResponseGenerator::new(runtime.clone(), config.clone());
        let arbiter = ActionArbiter::new(runtime, &config);
        Self {
            catalog,
            scorer,
            generator,
            arbiter,
            rendered_recommendations: config.rendered_recommendations,
        }
    }

    /// Ranked top-K item ids for the context.
    pub async fn recommend(&self, context: &ConversationContext) -> Result<Vec<EntityId>> {
        self.scorer.score(context).await
    }

    /// Labeled evaluation variant of [`Self::recommend`].
    pub async fn recommend_labeled(
        &self,
        context: &ConversationContext,
    ) -> Result<(Vec<Vec<EntityId>>, Vec<EntityId>)> {
        self.scorer.score_labeled(context).await
    }

    /// Candidate continuation plus the inputs it was decoded from.
    pub async fn converse(
        &self,
        context: &ConversationContext,
    ) -> Result<(GenerationInputs, String)> {
        self.generator.generate(context).await
    }

    /// Arbitrate the next action for already-generated inputs.
    pub async fn choose(
        &self,
        inputs: &GenerationInputs,
        options: &OptionSet,
        state: PenaltyState,
    ) -> Result<(String, PenaltyState)> {
        self.arbiter.choose(inputs, options, state).await
    }

    /// One full turn: generate a candidate continuation, arbitrate, and
    /// either substitute a rendered recommendation list (reserved last
    /// option) or clean up and return the generated text.
    pub async fn respond(
        &self,
        context: &ConversationContext,
        options: &OptionSet,
        state: PenaltyState,
    ) -> Result<(String, PenaltyState)> {
        let (inputs, candidate) = self.generator.generate(context).await?;
        let (choice, state) = self.arbiter.choose(&inputs, options, state).await?;
        info!("Arbiter chose option '{}'", choice);

        let response = if options.is_recommend(&choice) {
            let ranked = self.scorer.score(context).await?;
            render_recommendations(&self.catalog, &ranked, self.rendered_recommendations)?
        } else {
            strip_role_artifact(&candidate).trim().to_string()
        };

        Ok((response, state))
    }
}

/// Render ranked item ids as a numbered list under a fixed header.
///
/// An id missing from the name table is a fatal error for the turn: the
/// item universe and the naming table are consistent by construction, so a
/// miss means the catalog is broken, not that the item should be skipped.
pub fn render_recommendations(
    catalog: &EntityCatalog,
    ranked: &[EntityId],
    count: usize,
) -> Result<String> {
    let mut rendered = String::from(RECOMMENDATION_HEADER);
    for (i, &id) in ranked.iter().take(count).enumerate() {
        let name = catalog
            .require_name(id)
            .with_context(|| format!("rendering recommendation rank {}", i + 1))?;
        rendered.push_str(&format!("{}: {}\n", i + 1, name));
    }
    Ok(rendered)
}

/// Cleanup for a decoding artifact: the generator was trained on
/// role-prefixed targets, so its replies open with a mangled `"System;:"`
/// tag. Strip those leading characters; the caller trims whitespace.
pub fn strip_role_artifact(text: &str) -> &str {
    text.trim_start_matches(|c| "System;:".contains(c))
}
