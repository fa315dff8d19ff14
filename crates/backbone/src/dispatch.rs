//! Backbone selection by model name.
//!
//! Backends are a closed set: a tagged enum rather than trait objects, so
//! the capability surface stays uniform and no state is shared between
//! variants. Model names like `"barcor_redial"` select by their prefix up
//! to the first underscore.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};

use catalog::{EntityCatalog, EntityId};
use dialogue::{ConversationContext, OptionSet, PenaltyState};
use model_client::ModelRuntime;

use crate::barcor::BarcorBackbone;
use crate::config::BackboneConfig;
use crate::generator::GenerationInputs;

/// Which backbone drives a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneKind {
    Barcor,
}

impl FromStr for BackboneKind {
    type Err = anyhow::Error;

    /// Parse a model name. Unknown names are a configuration error,
    /// raised before any backbone state exists.
    fn from_str(name: &str) -> Result<Self> {
        let prefix = name.split('_').next().unwrap_or(name);
        match prefix.to_ascii_lowercase().as_str() {
            "barcor" => Ok(BackboneKind::Barcor),
            other => bail!("unknown backbone '{other}' (expected one of: barcor)"),
        }
    }
}

impl fmt::Display for BackboneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackboneKind::Barcor => write!(f, "barcor"),
        }
    }
}

/// A constructed backbone with the uniform capability surface the
/// orchestrator programs against.
pub enum Backbone {
    Barcor(BarcorBackbone),
}

impl Backbone {
    pub fn new(
        kind: BackboneKind,
        catalog: Arc<EntityCatalog>,
        runtime: Arc<dyn ModelRuntime>,
        config: BackboneConfig,
    ) -> Self {
        match kind {
            BackboneKind::Barcor => {
                Backbone::Barcor(BarcorBackbone::new(catalog, runtime, config))
            }
        }
    }

    pub fn kind(&self) -> BackboneKind {
        match self {
            Backbone::Barcor(_) => BackboneKind::Barcor,
        }
    }

    pub async fn recommend(&self, context: &ConversationContext) -> Result<Vec<EntityId>> {
        match self {
            Backbone::Barcor(b) => b.recommend(context).await,
        }
    }

    pub async fn converse(
        &self,
        context: &ConversationContext,
    ) -> Result<(GenerationInputs, String)> {
        match self {
            Backbone::Barcor(b) => b.converse(context).await,
        }
    }

    pub async fn choose(
        &self,
        inputs: &GenerationInputs,
        options: &OptionSet,
        state: PenaltyState,
    ) -> Result<(String, PenaltyState)> {
        match self {
            Backbone::Barcor(b) => b.choose(inputs, options, state).await,
        }
    }

    pub async fn respond(
        &self,
        context: &ConversationContext,
        options: &OptionSet,
        state: PenaltyState,
    ) -> Result<(String, PenaltyState)> {
        match self {
            Backbone::Barcor(b) => b.respond(context, options, state).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_by_prefix() {
        assert_eq!("barcor".parse::<BackboneKind>().unwrap(), BackboneKind::Barcor);
        assert_eq!(
            "barcor_redial".parse::<BackboneKind>().unwrap(),
            BackboneKind::Barcor
        );
        assert_eq!(
            "BARCOR_opendialkg".parse::<BackboneKind>().unwrap(),
            BackboneKind::Barcor
        );
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        assert!("kbrd_redial".parse::<BackboneKind>().is_err());
        assert!("".parse::<BackboneKind>().is_err());
    }

    #[test]
    fn test_kind_displays_as_name() {
        assert_eq!(BackboneKind::Barcor.to_string(), "barcor");
    }
}
