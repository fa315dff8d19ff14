//! Scripted [`ModelRuntime`] used by the unit tests in this crate.

use std::collections::HashMap;

use async_trait::async_trait;

use model_client::{
    EncodeOptions, GenerateParams, Generation, ModelError, ModelRuntime, PaddedBatch,
};

/// A runtime that replays canned outputs instead of calling a service.
///
/// `encode` consults the `vocab` map for exact-text hits (used to give
/// option tokens like `" a"` known ids) and otherwise derives ids from the
/// text bytes. `score` repeats its last configured row when the batch is
/// larger than the script.
#[derive(Debug, Default, Clone)]
pub(crate) struct ScriptedRuntime {
    pub vocab: HashMap<String, u32>,
    pub logits: Vec<Vec<f32>>,
    pub step_scores: Vec<Vec<f32>>,
    pub generated_ids: Vec<u32>,
    pub decoded: String,
}

impl ScriptedRuntime {
    pub fn with_logits(logits: Vec<Vec<f32>>) -> Self {
        Self {
            logits,
            ..Self::default()
        }
    }

    pub fn with_step_scores(vocab: HashMap<String, u32>, step_scores: Vec<Vec<f32>>) -> Self {
        Self {
            vocab,
            step_scores,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ModelRuntime for ScriptedRuntime {
    async fn encode(&self, text: &str, _options: EncodeOptions) -> Result<Vec<u32>, ModelError> {
        if let Some(&id) = self.vocab.get(text) {
            return Ok(vec![id]);
        }
        Ok(text.bytes().take(8).map(u32::from).collect())
    }

    async fn decode(
        &self,
        _token_ids: &[u32],
        _skip_special_tokens: bool,
    ) -> Result<String, ModelError> {
        Ok(self.decoded.clone())
    }

    async fn pad(
        &self,
        sequences: Vec<Vec<u32>>,
        max_length: u32,
        pad_to_multiple_of: u32,
    ) -> Result<PaddedBatch, ModelError> {
        let longest = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut width = (max_length as usize).max(longest);
        let multiple = pad_to_multiple_of.max(1) as usize;
        width = width.div_ceil(multiple) * multiple;

        let mut batch = PaddedBatch::default();
        for sequence in sequences {
            let mut mask = vec![1u32; sequence.len()];
            mask.resize(width, 0);
            let mut ids = sequence;
            ids.resize(width, 0);
            batch.input_ids.push(ids);
            batch.attention_mask.push(mask);
        }
        Ok(batch)
    }

    async fn score(&self, batch: PaddedBatch) -> Result<Vec<Vec<f32>>, ModelError> {
        if self.logits.is_empty() {
            return Err(ModelError::InvalidResponse("no scripted logits".into()));
        }
        Ok((0..batch.len())
            .map(|i| self.logits[i.min(self.logits.len() - 1)].clone())
            .collect())
    }

    async fn generate(
        &self,
        _batch: PaddedBatch,
        params: GenerateParams,
    ) -> Result<Generation, ModelError> {
        Ok(Generation {
            sequences: vec![self.generated_ids.clone()],
            step_scores: if params.output_scores {
                self.step_scores.clone()
            } else {
                Vec::new()
            },
        })
    }
}
