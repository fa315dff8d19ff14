//! The runtime interface the orchestration layer depends on.
//!
//! Five calls cover everything the core needs from the model side:
//! `encode`/`decode`/`pad` for the tokenizer and `score`/`generate` for the
//! two model heads. The gRPC [`crate::ModelClient`] is the production
//! implementation; tests script their own.

use async_trait::async_trait;

use crate::ModelError;

/// A tokenized batch padded for aligned tensor execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaddedBatch {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
}

impl PaddedBatch {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Tokenization options for [`ModelRuntime::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Token budget; `None` means unbounded.
    pub max_length: Option<u32>,
    /// Drop the oldest content first when over budget.
    pub truncate_left: bool,
    pub add_special_tokens: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_length: None,
            truncate_left: true,
            add_special_tokens: true,
        }
    }
}

impl EncodeOptions {
    /// Bounded encoding, oldest content dropped first.
    pub fn truncated(max_length: u32) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::default()
        }
    }

    /// Bare token ids with no special tokens, e.g. for looking up the
    /// id of a single option token.
    pub fn raw_tokens() -> Self {
        Self {
            add_special_tokens: false,
            ..Self::default()
        }
    }
}

/// Decoding parameters for [`ModelRuntime::generate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateParams {
    pub min_new_tokens: u32,
    pub max_new_tokens: u32,
    /// Total output length bound; 0 leaves it to the service default.
    pub max_length: u32,
    pub num_beams: u32,
    pub no_repeat_ngram_size: u32,
    pub encoder_no_repeat_ngram_size: u32,
    /// Ask for the per-step score distributions alongside the sequences.
    pub output_scores: bool,
}

impl GenerateParams {
    /// Greedy decoding bounded by a total length, with 3-gram repetition
    /// suppressed both within the continuation and against the input.
    pub fn greedy_bounded(max_length: u32) -> Self {
        Self {
            max_length,
            num_beams: 1,
            no_repeat_ngram_size: 3,
            encoder_no_repeat_ngram_size: 3,
            ..Self::default()
        }
    }

    /// Greedy decoding of exactly `n` new tokens, with step scores.
    pub fn fixed_new_tokens(n: u32) -> Self {
        Self {
            min_new_tokens: n,
            max_new_tokens: n,
            num_beams: 1,
            output_scores: true,
            ..Self::default()
        }
    }
}

/// Result of a `generate` call.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// One decoded token sequence per batch example.
    pub sequences: Vec<Vec<u32>>,
    /// Score distribution per generation step for the first batch example;
    /// empty unless `output_scores` was requested.
    pub step_scores: Vec<Vec<f32>>,
}

/// The model/tokenization runtime consumed by the orchestration layer.
///
/// Heavy compute is a black-box synchronous call from the caller's point
/// of view: each method runs to completion or fails, with no partial
/// results and no retries at this layer.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Tokenize text into ids.
    async fn encode(&self, text: &str, options: EncodeOptions) -> Result<Vec<u32>, ModelError>;

    /// Detokenize ids back into text.
    async fn decode(&self, token_ids: &[u32], skip_special_tokens: bool)
        -> Result<String, ModelError>;

    /// Pad sequences to `max_length` in multiples of `pad_to_multiple_of`.
    /// Padding side and value are the service's concern.
    async fn pad(
        &self,
        sequences: Vec<Vec<u32>>,
        max_length: u32,
        pad_to_multiple_of: u32,
    ) -> Result<PaddedBatch, ModelError>;

    /// Run the classifier head: one label-space logits row per example.
    async fn score(&self, batch: PaddedBatch) -> Result<Vec<Vec<f32>>, ModelError>;

    /// Run the seq2seq generator.
    async fn generate(
        &self,
        batch: PaddedBatch,
        params: GenerateParams,
    ) -> Result<Generation, ModelError>;
}
