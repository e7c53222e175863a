//! Exact-text confirmation for irreversible actions.

/// One modal interaction's worth of typed confirmation.
///
/// The match is literal: case, whitespace and punctuation all count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationAttempt {
    required: &'static str,
    typed: String,
}

impl ConfirmationAttempt {
    pub fn new(required: &'static str) -> Self {
        Self {
            required,
            typed: String::new(),
        }
    }

    pub fn required(&self) -> &'static str {
        self.required
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Replace the typed text with the current input value.
    pub fn set_typed(&mut self, input: impl Into<String>) {
        self.typed = input.into();
    }

    pub fn matches(&self) -> bool {
        self.typed == self.required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_phrase_matches() {
        let mut attempt = ConfirmationAttempt::new("DELETE MY ACCOUNT");
        assert!(!attempt.matches());

        for wrong in ["delete my account", "DELETE MY ACCOUNT ", " DELETE MY ACCOUNT", "DELETE  MY ACCOUNT"] {
            attempt.set_typed(wrong);
            assert!(!attempt.matches(), "{wrong:?} should not match");
        }

        attempt.set_typed("DELETE MY ACCOUNT");
        assert!(attempt.matches());
    }
}
