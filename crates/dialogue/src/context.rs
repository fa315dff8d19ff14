//! Building the role-tagged model context from a turn list.

use crate::types::Role;

/// Turns an utterance list into the single tagged string fed to the models.
///
/// Each non-empty utterance is prefixed with its positional role tag and
/// the results are joined with the model's separator token. Empty
/// utterances are dropped from the output but still counted for parity, so
/// callers must pass the turn list in original order, blanks included.
///
/// Tokenization and left-truncation to the context budget happen at the
/// model boundary, not here.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    separator: String,
}

impl ContextBuilder {
    /// # Arguments
    /// * `separator` - the model's separator token, e.g. `"</s>"`
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn build(&self, utterances: &[String]) -> String {
        let tagged: Vec<String> = utterances
            .iter()
            .enumerate()
            .filter(|(_, utt)| !utt.is_empty())
            .map(|(position, utt)| format!("{}{}", Role::for_position(position).prefix(), utt))
            .collect();
        tagged.join(&self.separator)
    }

    /// The role that would speak the turn after `utterance_count` turns.
    /// Used to prefix the generation target the same way training did.
    pub fn next_role(utterance_count: usize) -> Role {
        Role::for_position(utterance_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterances(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_alternates_prefixes() {
        let builder = ContextBuilder::new("</s>");
        let built = builder.build(&utterances(&["hi", "hello there", "any thrillers?"]));
        assert_eq!(built, "User: hi</s>System: hello there</s>User: any thrillers?");
    }

    #[test]
    fn test_empty_turns_keep_their_position() {
        let builder = ContextBuilder::new("</s>");
        // Position 1 is empty: it is dropped from the output but position 2
        // still tags as User.
        let built = builder.build(&utterances(&["hi", "", "hello"]));
        assert_eq!(built, "User: hi</s>User: hello");
    }

    #[test]
    fn test_build_empty_context() {
        let builder = ContextBuilder::new("</s>");
        assert_eq!(builder.build(&[]), "");
    }

    #[test]
    fn test_next_role() {
        assert_eq!(ContextBuilder::next_role(0), Role::User);
        assert_eq!(ContextBuilder::next_role(3), Role::System);
        assert_eq!(ContextBuilder::next_role(4), Role::User);
    }
}
