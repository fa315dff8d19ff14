//! Client for the external model-inference service.
//!
//! The pretrained sequence models (the classifier over the entity label
//! space and the seq2seq generator) together with their tokenizer live in
//! a separate service; this crate talks to it over gRPC. It handles:
//! - Connection management to the inference service
//! - Converting between domain types and protobuf messages
//! - Validating response shapes
//!
//! The rest of the system programs against the [`ModelRuntime`] trait, not
//! the concrete client, so tests can substitute a scripted runtime.

use thiserror::Error;

// Include the generated protobuf code
pub mod inference {
    tonic::include_proto!("inference");
}

mod client;
mod runtime;

pub use client::ModelClient;
pub use runtime::{
    EncodeOptions, GenerateParams, Generation, ModelRuntime, PaddedBatch,
};

/// Errors that can occur when interacting with the model service
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to connect to model service: {0}")]
    ConnectionError(String),

    #[error("Model call failed: {0}")]
    RpcError(String),

    #[error("Invalid response from model service: {0}")]
    InvalidResponse(String),
}
