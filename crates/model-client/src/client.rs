//! The tonic-backed implementation of [`ModelRuntime`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use tonic::transport::Channel;
use tracing::{debug, error, info};

use crate::inference as proto;
use crate::inference::sequence_model_client::SequenceModelClient as GrpcSequenceModelClient;
use crate::runtime::{EncodeOptions, GenerateParams, Generation, ModelRuntime, PaddedBatch};
use crate::ModelError;

/// gRPC client for the model-inference service.
///
/// Wraps the auto-generated client; the channel is cheap to clone, so the
/// trait methods work from `&self`.
#[derive(Clone)]
pub struct ModelClient {
    client: GrpcSequenceModelClient<Channel>,
    service_addr: String,
}

impl ModelClient {
    /// Connect to the model-inference service.
    ///
    /// # Arguments
    /// * `addr` - Address of the gRPC service (e.g., "http://localhost:50051")
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        info!("Connecting to model service at {}", addr);

        let channel = Channel::from_shared(addr.clone())
            .context("Creating channel from address")?
            .connect()
            .await
            .context("Connecting to model service")?;

        let client = GrpcSequenceModelClient::new(channel);
        Ok(ModelClient {
            client,
            service_addr: addr,
        })
    }

    /// Get the address of the model service this client is connected to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }

    fn rpc_error(call: &str, status: tonic::Status) -> ModelError {
        error!("gRPC error in {}: {}", call, status);
        ModelError::RpcError(format!("{call}: {status}"))
    }
}

fn batch_to_proto(batch: PaddedBatch) -> proto::Batch {
    proto::Batch {
        input_ids: batch
            .input_ids
            .into_iter()
            .map(|token_ids| proto::TokenSequence { token_ids })
            .collect(),
        attention_mask: batch
            .attention_mask
            .into_iter()
            .map(|token_ids| proto::TokenSequence { token_ids })
            .collect(),
    }
}

fn batch_from_proto(batch: proto::Batch) -> PaddedBatch {
    PaddedBatch {
        input_ids: batch.input_ids.into_iter().map(|s| s.token_ids).collect(),
        attention_mask: batch
            .attention_mask
            .into_iter()
            .map(|s| s.token_ids)
            .collect(),
    }
}

fn params_to_proto(params: GenerateParams) -> proto::GenerateParams {
    proto::GenerateParams {
        min_new_tokens: params.min_new_tokens,
        max_new_tokens: params.max_new_tokens,
        max_length: params.max_length,
        num_beams: params.num_beams,
        no_repeat_ngram_size: params.no_repeat_ngram_size,
        encoder_no_repeat_ngram_size: params.encoder_no_repeat_ngram_size,
        output_scores: params.output_scores,
    }
}

#[async_trait]
impl ModelRuntime for ModelClient {
    async fn encode(&self, text: &str, options: EncodeOptions) -> Result<Vec<u32>, ModelError> {
        let request = tonic::Request::new(proto::EncodeRequest {
            text: text.to_string(),
            max_length: options.max_length.unwrap_or(0),
            truncate_left: options.truncate_left,
            add_special_tokens: options.add_special_tokens,
        });

        let reply = self
            .client
            .clone()
            .encode(request)
            .await
            .map_err(|status| Self::rpc_error("encode", status))?;
        Ok(reply.into_inner().token_ids)
    }

    async fn decode(
        &self,
        token_ids: &[u32],
        skip_special_tokens: bool,
    ) -> Result<String, ModelError> {
        let request = tonic::Request::new(proto::DecodeRequest {
            token_ids: token_ids.to_vec(),
            skip_special_tokens,
        });

        let reply = self
            .client
            .clone()
            .decode(request)
            .await
            .map_err(|status| Self::rpc_error("decode", status))?;
        Ok(reply.into_inner().text)
    }

    async fn pad(
        &self,
        sequences: Vec<Vec<u32>>,
        max_length: u32,
        pad_to_multiple_of: u32,
    ) -> Result<PaddedBatch, ModelError> {
        let expected = sequences.len();
        let request = tonic::Request::new(proto::PadRequest {
            sequences: sequences
                .into_iter()
                .map(|token_ids| proto::TokenSequence { token_ids })
                .collect(),
            max_length,
            pad_to_multiple_of,
        });

        let reply = self
            .client
            .clone()
            .pad(request)
            .await
            .map_err(|status| Self::rpc_error("pad", status))?;
        let batch = reply
            .into_inner()
            .batch
            .map(batch_from_proto)
            .ok_or_else(|| ModelError::InvalidResponse("pad reply missing batch".into()))?;

        if batch.len() != expected {
            return Err(ModelError::InvalidResponse(format!(
                "pad returned {} sequences for {} inputs",
                batch.len(),
                expected
            )));
        }
        Ok(batch)
    }

    async fn score(&self, batch: PaddedBatch) -> Result<Vec<Vec<f32>>, ModelError> {
        let expected = batch.len();
        debug!("Scoring batch of {} examples", expected);

        let request = tonic::Request::new(proto::ScoreRequest {
            batch: Some(batch_to_proto(batch)),
        });
        let reply = self
            .client
            .clone()
            .score(request)
            .await
            .map_err(|status| Self::rpc_error("score", status))?;
        let logits: Vec<Vec<f32>> = reply
            .into_inner()
            .logits
            .into_iter()
            .map(|row| row.values)
            .collect();

        if logits.len() != expected {
            error!(
                "Mismatch in logits rows: expected {}, got {}",
                expected,
                logits.len()
            );
            return Err(ModelError::InvalidResponse(
                "number of logits rows does not match the batch".into(),
            ));
        }
        Ok(logits)
    }

    async fn generate(
        &self,
        batch: PaddedBatch,
        params: GenerateParams,
    ) -> Result<Generation, ModelError> {
        let want_scores = params.output_scores;
        let request = tonic::Request::new(proto::GenerateRequest {
            batch: Some(batch_to_proto(batch)),
            params: Some(params_to_proto(params)),
        });

        let reply = self
            .client
            .clone()
            .generate(request)
            .await
            .map_err(|status| Self::rpc_error("generate", status))?;
        let reply = reply.into_inner();

        if reply.sequences.is_empty() {
            return Err(ModelError::InvalidResponse(
                "generate returned no sequences".into(),
            ));
        }
        if want_scores && reply.step_scores.is_empty() {
            return Err(ModelError::InvalidResponse(
                "step scores requested but missing from generate reply".into(),
            ));
        }

        Ok(Generation {
            sequences: reply.sequences.into_iter().map(|s| s.token_ids).collect(),
            step_scores: reply.step_scores.into_iter().map(|r| r.values).collect(),
        })
    }
}
