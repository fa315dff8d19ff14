//! Action option sets and the cross-turn penalty state.
//!
//! Every turn, the arbiter picks one option from a small enumerated set.
//! By convention the LAST option always means "produce a recommendation";
//! every other option continues the dialogue along its strategy. Once an
//! option has been chosen its penalty entry is pushed far negative so the
//! arbiter will not keep reselecting it in later turns.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Additive bias applied to an option once it has been chosen.
/// Large enough to dominate any raw model score.
pub const CHOICE_PENALTY: f32 = -1.0e5;

/// One selectable action: a short label (the token the model is scored on)
/// and its natural-language description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionChoice {
    pub label: String,
    pub description: String,
}

impl ActionChoice {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Ordered option labels with their action descriptions, plus the prompt
/// text that presents them. The last entry is reserved for "recommend".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSet {
    prompt: String,
    choices: Vec<ActionChoice>,
}

impl OptionSet {
    pub fn new(prompt: impl Into<String>, choices: Vec<ActionChoice>) -> Result<Self> {
        if choices.is_empty() {
            bail!("an option set needs at least one choice");
        }
        Ok(Self {
            prompt: prompt.into(),
            choices,
        })
    }

    /// The default option set for the movie domain.
    pub fn builtin() -> Self {
        Self {
            prompt: "Choose how to continue the conversation:".to_string(),
            choices: vec![
                ActionChoice::new("a", "ask the user about their genre preferences"),
                ActionChoice::new("b", "ask the user which movies they enjoyed"),
                ActionChoice::new("c", "chat about the movies mentioned so far"),
                ActionChoice::new("d", "recommend movies to the user"),
            ],
        }
    }

    /// Prompt text presenting the options. Not every backbone consumes it;
    /// prompting-based ones splice it into their context.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn choices(&self) -> &[ActionChoice] {
        &self.choices
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.choices.iter().map(|c| c.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        false // construction rejects empty sets
    }

    /// The reserved last label meaning "produce a recommendation".
    pub fn recommend_label(&self) -> &str {
        &self.choices[self.choices.len() - 1].label
    }

    pub fn is_recommend(&self, label: &str) -> bool {
        self.recommend_label() == label
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.choices.iter().position(|c| c.label == label)
    }
}

/// Additive bias vector over the option set, one entry per option.
///
/// Owned by the caller between turns: `reply` takes it in and hands the
/// updated vector back, so the components themselves stay stateless. A
/// vector whose length doesn't match the option count is reset to zeros by
/// the orchestrator, never treated as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyState(Vec<f32>);

impl PenaltyState {
    /// Zeroed state for an option set of `len` options.
    pub fn fresh(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn from_vec(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this state is shaped for an option set of `option_count`.
    pub fn matches(&self, option_count: usize) -> bool {
        self.0.len() == option_count
    }

    /// Bias for option `index`. Callers guarantee the shape beforehand.
    pub fn bias(&self, index: usize) -> f32 {
        self.0[index]
    }

    /// Push option `index` far negative for the rest of the conversation.
    pub fn penalize(&mut self, index: usize) {
        self.0[index] = CHOICE_PENALTY;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_option_set_rejected() {
        assert!(OptionSet::new("prompt", vec![]).is_err());
    }

    #[test]
    fn test_last_option_is_recommend() {
        let options = OptionSet::builtin();
        assert_eq!(options.recommend_label(), "d");
        assert!(options.is_recommend("d"));
        assert!(!options.is_recommend("a"));
    }

    #[test]
    fn test_fresh_state_is_zeroed() {
        let options = OptionSet::builtin();
        let state = PenaltyState::fresh(options.len());

        assert_eq!(state.len(), options.len());
        assert!(state.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_penalize_touches_one_entry() {
        let mut state = PenaltyState::fresh(3);
        state.penalize(1);

        assert_eq!(state.as_slice(), &[0.0, CHOICE_PENALTY, 0.0]);
    }

    #[test]
    fn test_penalize_is_idempotent() {
        let mut state = PenaltyState::fresh(3);
        state.penalize(2);
        state.penalize(2);

        assert_eq!(state.bias(2), CHOICE_PENALTY);
        assert_eq!(state.as_slice(), &[0.0, 0.0, CHOICE_PENALTY]);
    }

    #[test]
    fn test_matches_shape() {
        let state = PenaltyState::from_vec(vec![0.0, 0.0]);
        assert!(state.matches(2));
        assert!(!state.matches(4));
    }
}
