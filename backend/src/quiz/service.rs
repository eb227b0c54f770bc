use std::sync::Arc;

use crate::llm::{LlmError, TextGenerator};
use crate::models::User;
use crate::store::{StoreError, UserStore};

/// Result of a metered quiz request.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    /// Balance too low; nothing was debited or generated.
    InsufficientTokens { balance: i64, requested: i64 },
    /// The model answered. `balance` is after the debit.
    Generated { content: String, balance: i64 },
    /// The model call failed. Tokens are still consumed.
    Failed { message: String, balance: i64 },
}

impl QuizOutcome {
    /// Balance left after the request.
    pub fn balance(&self) -> i64 {
        match self {
            QuizOutcome::InsufficientTokens { balance, .. }
            | QuizOutcome::Generated { balance, .. }
            | QuizOutcome::Failed { balance, .. } => *balance,
        }
    }
}

/// Wraps the model call that turns study notes into quiz questions.
#[derive(Clone)]
pub struct QuizService {
    generator: Arc<dyn TextGenerator>,
}

/// Instruction sent to the model for `num_questions` questions over `notes`.
pub fn build_prompt(notes: &str, num_questions: i64) -> String {
    format!(
        "Generate {} unique quiz questions with answers based on these notes:\n{}",
        num_questions, notes
    )
}

impl QuizService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Ask the model for a quiz. The text comes back verbatim.
    pub async fn generate(&self, notes: &str, num_questions: i64) -> Result<String, LlmError> {
        self.generator.generate(&build_prompt(notes, num_questions)).await
    }

    /// Check the user's balance, debit it, and generate the quiz.
    ///
    /// Tokens are reserved with a single conditional update before the model
    /// is called and are not refunded if generation fails.
    pub async fn request_quiz(
        &self,
        store: &UserStore,
        user: &User,
        notes: &str,
        num_questions: i64,
    ) -> Result<QuizOutcome, StoreError> {
        if !user.can_afford(num_questions) {
            return Ok(QuizOutcome::InsufficientTokens {
                balance: user.tokens,
                requested: num_questions,
            });
        }

        // The balance may have moved since the session was loaded.
        let Some(balance) = store.debit_tokens(user.id, num_questions)? else {
            let balance = store.get_user(user.id)?.map_or(user.tokens, |u| u.tokens);
            return Ok(QuizOutcome::InsufficientTokens {
                balance,
                requested: num_questions,
            });
        };

        match self.generate(notes, num_questions).await {
            Ok(content) => Ok(QuizOutcome::Generated { content, balance }),
            Err(e) => {
                tracing::warn!(user_id = user.id, num_questions, "Quiz generation failed: {}", e);
                Ok(QuizOutcome::Failed {
                    message: format!("Error generating quiz: {}", e),
                    balance,
                })
            }
        }
    }
}
