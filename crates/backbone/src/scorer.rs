//! Recommendation scoring against the item catalog.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::debug;

use catalog::{EntityCatalog, EntityId};
use dialogue::{ContextBuilder, ConversationContext};
use model_client::{EncodeOptions, ModelRuntime};

use crate::config::BackboneConfig;

/// Scores the whole catalog against the dialogue context and returns the
/// top-K items.
///
/// The classifier head emits one logit per entity in the label space; only
/// the item subset is ranked. Entity mentions that are not in the catalog
/// are dropped silently before scoring, never an error.
pub struct RecommendationScorer {
    catalog: Arc<EntityCatalog>,
    runtime: Arc<dyn ModelRuntime>,
    config: BackboneConfig,
}

impl RecommendationScorer {
    pub fn new(
        catalog: Arc<EntityCatalog>,
        runtime: Arc<dyn ModelRuntime>,
        config: BackboneConfig,
    ) -> Self {
        Self {
            catalog,
            runtime,
            config,
        }
    }

    async fn encode_context(&self, utterances: &[String]) -> Result<Vec<u32>> {
        let context = ContextBuilder::new(&self.config.separator).build(utterances);
        self.runtime
            .encode(&context, EncodeOptions::truncated(self.config.context_max_length))
            .await
            .context("encoding dialogue context")
    }

    /// Inference mode: score a single unlabeled example.
    ///
    /// # Returns
    /// Item ids ranked highest-score first, at most `top_k` of them.
    pub async fn score(&self, context: &ConversationContext) -> Result<Vec<EntityId>> {
        let context_ids = self.encode_context(&context.utterances).await?;

        // Unknown mentions are excluded here; the classifier itself only
        // consumes the context, the resolved ids ride along for backbones
        // that condition on them.
        let mentioned = self.catalog.resolve_ids(&context.mentions);
        debug!(
            "Scoring with {} resolved mentions (of {} extracted)",
            mentioned.len(),
            context.mentions.len()
        );

        let batch = self
            .runtime
            .pad(
                vec![context_ids],
                self.config.context_max_length,
                self.config.pad_to_multiple_of,
            )
            .await
            .context("padding scoring batch")?;
        let logits = self.runtime.score(batch).await.context("scoring catalog items")?;
        let row = logits
            .first()
            .context("model returned no logits for the scoring example")?;

        self.rank_items(row)
    }

    /// Labeled mode (evaluation): one example per ground-truth target,
    /// targets missing from the catalog skipped.
    ///
    /// # Returns
    /// Per-example rankings plus the resolved label ids, in step.
    pub async fn score_labeled(
        &self,
        context: &ConversationContext,
    ) -> Result<(Vec<Vec<EntityId>>, Vec<EntityId>)> {
        let labels = self.catalog.resolve_ids(&context.targets);
        if labels.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let context_ids = self.encode_context(&context.utterances).await?;
        let batch = self
            .runtime
            .pad(
                vec![context_ids; labels.len()],
                self.config.context_max_length,
                self.config.pad_to_multiple_of,
            )
            .await
            .context("padding labeled scoring batch")?;
        let logits = self.runtime.score(batch).await.context("scoring labeled examples")?;
        if logits.len() != labels.len() {
            bail!(
                "scored {} examples but expected {}",
                logits.len(),
                labels.len()
            );
        }

        let rankings = logits
            .iter()
            .map(|row| self.rank_items(row))
            .collect::<Result<Vec<_>>>()?;
        Ok((rankings, labels))
    }

    /// Restrict a label-space logits row to the item subset and rank it.
    /// Stable sort keeps ties deterministic for a fixed model state.
    fn rank_items(&self, logits: &[f32]) -> Result<Vec<EntityId>> {
        if logits.len() < self.catalog.num_entities() {
            bail!(
                "logits row of width {} does not cover the {}-entry label space",
                logits.len(),
                self.catalog.num_entities()
            );
        }

        let mut ranked: Vec<(EntityId, f32)> = self
            .catalog
            .item_ids()
            .iter()
            .map(|&id| (id, logits[id as usize]))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(self.config.top_k);

        Ok(ranked.into_iter().map(|(id, _)| id).collect())
    }
}
