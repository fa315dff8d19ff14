//! # Backbone Crate
//!
//! The model backbone for the conversational recommender: everything
//! between the dialogue data model and the model-inference runtime.
//!
//! ## Architecture
//! A turn flows through three stages:
//! 1. **ResponseGenerator** decodes a candidate continuation from the
//!    tagged dialogue context
//! 2. **ActionArbiter** classifies which action the model intends,
//!    biased by the cross-turn penalty state
//! 3. On the reserved "recommend" option, **RecommendationScorer** ranks
//!    the catalog and the reply becomes a rendered top-3 list; otherwise
//!    the candidate text is cleaned and returned
//!
//! `BarcorBackbone::respond` composes the three; the `Backbone` enum
//! dispatches over the closed set of backbone kinds.
//!
//! ## Example Usage
//! ```ignore
//! use backbone::{Backbone, BackboneConfig, BackboneKind};
//!
//! let kind: BackboneKind = "barcor_redial".parse()?;
//! let backbone = Backbone::new(kind, catalog, runtime, BackboneConfig::default());
//! let (reply, state) = backbone.respond(&context, &options, state).await?;
//! ```

pub mod arbiter;
pub mod barcor;
pub mod config;
pub mod dispatch;
pub mod generator;
pub mod scorer;

#[cfg(test)]
mod testing;

// Re-export main types
pub use arbiter::ActionArbiter;
pub use barcor::{render_recommendations, strip_role_artifact, BarcorBackbone};
pub use config::BackboneConfig;
pub use dispatch::{Backbone, BackboneKind};
pub use generator::{GenerationInputs, ResponseGenerator};
pub use scorer::RecommendationScorer;
