//! Free-text reply generation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use dialogue::{ContextBuilder, ConversationContext};
use model_client::{EncodeOptions, GenerateParams, ModelRuntime, PaddedBatch};

use crate::config::BackboneConfig;

/// The padded tensors a generation ran from. The arbiter re-decodes from
/// the same inputs, so the generator hands them back alongside the text.
#[derive(Debug, Clone)]
pub struct GenerationInputs {
    pub inputs: PaddedBatch,
    /// Target-side tokens of the training-style example. Not supervision
    /// at inference; constructed the way training constructed them so the
    /// decoder sees the same shape.
    pub labels: PaddedBatch,
}

/// Produces a candidate continuation of the dialogue.
///
/// Decoding is deterministic: greedy, one beam, bounded length, 3-gram
/// repetition suppressed both inside the continuation and against the
/// encoder input.
pub struct ResponseGenerator {
    runtime: Arc<dyn ModelRuntime>,
    config: BackboneConfig,
}

impl ResponseGenerator {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config: BackboneConfig) -> Self {
        Self { runtime, config }
    }

    /// Build the training-style example for the context and decode a
    /// continuation from it.
    ///
    /// # Returns
    /// The padded inputs (for the arbiter) and the decoded text with
    /// special tokens stripped.
    pub async fn generate(
        &self,
        context: &ConversationContext,
    ) -> Result<(GenerationInputs, String)> {
        let builder = ContextBuilder::new(&self.config.separator);
        let context_str = builder.build(&context.utterances);
        let context_ids = self
            .runtime
            .encode(
                &context_str,
                EncodeOptions::truncated(self.config.context_max_length),
            )
            .await
            .context("encoding generation context")?;

        // The target opens with the role tag the next turn would carry.
        let target = format!(
            "{}{}",
            ContextBuilder::next_role(context.utterances.len()).prefix(),
            context.response
        );
        let target_ids = self
            .runtime
            .encode(&target, EncodeOptions::truncated(self.config.resp_max_length))
            .await
            .context("encoding generation target")?;

        let inputs = self
            .runtime
            .pad(
                vec![context_ids],
                self.config.context_max_length,
                self.config.pad_to_multiple_of,
            )
            .await
            .context("padding generation inputs")?;
        let labels = self
            .runtime
            .pad(
                vec![target_ids],
                self.config.context_max_length,
                self.config.pad_to_multiple_of,
            )
            .await
            .context("padding generation labels")?;

        let params = GenerateParams::greedy_bounded(self.config.resp_max_length);
        let generation = self
            .runtime
            .generate(inputs.clone(), params)
            .await
            .context("generating continuation")?;
        let sequence = generation
            .sequences
            .first()
            .context("generation returned no sequences")?;
        let text = self
            .runtime
            .decode(sequence, true)
            .await
            .context("decoding continuation")?;
        debug!("Generated candidate continuation: {:?}", text);

        Ok((GenerationInputs { inputs, labels }, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRuntime;

    #[tokio::test]
    async fn test_generate_returns_inputs_and_text() {
        let runtime = Arc::new(ScriptedRuntime {
            generated_ids: vec![2, 8, 9, 2],
            decoded: "System: do you prefer comedies?".to_string(),
            ..ScriptedRuntime::default()
        });
        let generator = ResponseGenerator::new(runtime, BackboneConfig::default());

        let context = ConversationContext {
            utterances: vec!["hi".to_string()],
            ..ConversationContext::default()
        };
        let (inputs, text) = generator.generate(&context).await.unwrap();

        assert_eq!(text, "System: do you prefer comedies?");
        assert_eq!(inputs.inputs.len(), 1);
        assert_eq!(inputs.labels.len(), 1);
        // Padded to the configured budget, aligned to a multiple of 8.
        assert_eq!(inputs.inputs.input_ids[0].len() % 8, 0);
    }
}
