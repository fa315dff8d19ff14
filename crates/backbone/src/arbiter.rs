//! Per-turn action arbitration.
//!
//! The arbiter decides, each turn, which action the generator "intends"
//! next: it re-decodes a handful of tokens from the generation inputs and
//! reads the score the model assigns to each option's token at the step
//! where the option word is emitted. A penalty vector carried across turns
//! biases the scores so the same action is not chosen again and again.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use dialogue::{OptionSet, PenaltyState};
use model_client::{EncodeOptions, GenerateParams, ModelRuntime};

use crate::config::BackboneConfig;
use crate::generator::GenerationInputs;

/// Chooses an option label from a short re-decode of the generation inputs.
pub struct ActionArbiter {
    runtime: Arc<dyn ModelRuntime>,
    choice_new_tokens: u32,
    choice_score_offset: usize,
}

impl ActionArbiter {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config: &BackboneConfig) -> Self {
        Self {
            runtime,
            choice_new_tokens: config.choice_new_tokens,
            choice_score_offset: config.choice_score_offset,
        }
    }

    /// Pick the next action.
    ///
    /// ## Algorithm
    /// 1. Greedy-decode exactly `choice_new_tokens` tokens from the same
    ///    inputs the candidate reply came from, capturing step scores.
    /// 2. Read the distribution at `choice_score_offset` steps from the
    ///    end; that step carries the option word under the prompt template.
    /// 3. Score each option by the distribution entry of the first token
    ///    of `" {label}"`, plus its penalty entry (an additive bias in raw
    ///    score space, not a renormalization).
    /// 4. Take the argmax (first maximum wins), penalize the chosen entry,
    ///    and hand the updated state back to the caller.
    ///
    /// The caller guarantees `state.len() == options.len()`; shape
    /// validation and recovery live in the orchestrator.
    pub async fn choose(
        &self,
        inputs: &GenerationInputs,
        options: &OptionSet,
        mut state: PenaltyState,
    ) -> Result<(String, PenaltyState)> {
        let params = GenerateParams::fixed_new_tokens(self.choice_new_tokens);
        let generation = self
            .runtime
            .generate(inputs.inputs.clone(), params)
            .await
            .context("decoding for action arbitration")?;

        let steps = &generation.step_scores;
        if steps.len() < self.choice_score_offset {
            bail!(
                "arbitration decode produced {} score steps, need at least {}",
                steps.len(),
                self.choice_score_offset
            );
        }
        let distribution = &steps[steps.len() - self.choice_score_offset];

        let mut best: Option<(usize, f32)> = None;
        for (index, choice) in options.choices().iter().enumerate() {
            let token_ids = self
                .runtime
                .encode(&format!(" {}", choice.label), EncodeOptions::raw_tokens())
                .await
                .with_context(|| format!("encoding option label '{}'", choice.label))?;
            let token = *token_ids
                .first()
                .ok_or_else(|| anyhow!("option label '{}' encodes to no tokens", choice.label))?;
            let raw = *distribution.get(token as usize).ok_or_else(|| {
                anyhow!(
                    "option token {} lies outside the {}-wide score distribution",
                    token,
                    distribution.len()
                )
            })?;

            let biased = raw + state.bias(index);
            debug!(
                "Option '{}': raw score {:.4}, biased {:.4}",
                choice.label, raw, biased
            );
            if best.is_none_or(|(_, top)| biased > top) {
                best = Some((index, biased));
            }
        }

        let (chosen_index, _) = best.ok_or_else(|| anyhow!("empty option set"))?;
        state.penalize(chosen_index);
        Ok((options.choices()[chosen_index].label.clone(), state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ResponseGenerator;
    use crate::testing::ScriptedRuntime;
    use dialogue::{ActionChoice, ConversationContext, CHOICE_PENALTY};
    use std::collections::HashMap;

    fn abc_options() -> OptionSet {
        OptionSet::new(
            "Choose:",
            vec![
                ActionChoice::new("a", "ask genre"),
                ActionChoice::new("b", "ask actor"),
                ActionChoice::new("c", "recommend"),
            ],
        )
        .unwrap()
    }

    /// Five decode steps; the second-to-last carries the real option
    /// scores (a=0.2, b=0.9, c=0.5 at token ids 3/4/5). The final step is
    /// deliberately misleading to pin down the offset.
    fn scripted_runtime() -> Arc<ScriptedRuntime> {
        let vocab = HashMap::from([
            (" a".to_string(), 3),
            (" b".to_string(), 4),
            (" c".to_string(), 5),
        ]);
        let flat = vec![0.0; 6];
        let mut option_step = vec![0.0; 6];
        option_step[3] = 0.2;
        option_step[4] = 0.9;
        option_step[5] = 0.5;
        let mut last_step = vec![0.0; 6];
        last_step[5] = 9.0;

        Arc::new(ScriptedRuntime::with_step_scores(
            vocab,
            vec![flat.clone(), flat.clone(), flat, option_step, last_step],
        ))
    }

    async fn test_inputs(runtime: Arc<ScriptedRuntime>) -> GenerationInputs {
        let generator = ResponseGenerator::new(runtime, BackboneConfig::default());
        let context = ConversationContext {
            utterances: vec!["hi".to_string()],
            ..ConversationContext::default()
        };
        generator.generate(&context).await.unwrap().0
    }

    #[tokio::test]
    async fn test_choose_reads_second_to_last_step() {
        let runtime = scripted_runtime();
        let arbiter = ActionArbiter::new(runtime.clone(), &BackboneConfig::default());
        let inputs = test_inputs(runtime).await;

        let (choice, state) = arbiter
            .choose(&inputs, &abc_options(), PenaltyState::fresh(3))
            .await
            .unwrap();

        // b wins on the second-to-last step even though the last step
        // would favour c.
        assert_eq!(choice, "b");
        assert_eq!(state.as_slice(), &[0.0, CHOICE_PENALTY, 0.0]);
    }

    #[tokio::test]
    async fn test_penalty_moves_choice_on_next_turn() {
        let runtime = scripted_runtime();
        let arbiter = ActionArbiter::new(runtime.clone(), &BackboneConfig::default());
        let inputs = test_inputs(runtime).await;
        let options = abc_options();

        let (first, state) = arbiter
            .choose(&inputs, &options, PenaltyState::fresh(3))
            .await
            .unwrap();
        assert_eq!(first, "b");

        // Same raw scores, but the fed-back penalty biases b to -99999.1,
        // so the runner-up c wins - the reserved recommend option.
        let (second, state) = arbiter.choose(&inputs, &options, state).await.unwrap();
        assert_eq!(second, "c");
        assert!(options.is_recommend(&second));
        assert_eq!(state.as_slice(), &[0.0, CHOICE_PENALTY, CHOICE_PENALTY]);
    }

    #[tokio::test]
    async fn test_too_few_steps_is_fatal() {
        let vocab = HashMap::from([(" a".to_string(), 3)]);
        let runtime = Arc::new(ScriptedRuntime::with_step_scores(vocab, vec![vec![0.0; 6]]));
        let config = BackboneConfig {
            choice_score_offset: 2,
            ..BackboneConfig::default()
        };
        let arbiter = ActionArbiter::new(runtime.clone(), &config);
        let inputs = test_inputs(runtime).await;

        let options = OptionSet::new("Choose:", vec![ActionChoice::new("a", "ask")]).unwrap();
        let result = arbiter.choose(&inputs, &options, PenaltyState::fresh(1)).await;
        assert!(result.is_err());
    }
}
