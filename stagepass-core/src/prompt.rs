use async_trait::async_trait;

/// Yes/no question put to the user before a repeat booking. The guard awaits
/// the answer before deciding whether to proceed.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Answers every prompt with a value the caller decided up front, e.g. the
/// `reconfirm` flag of an HTTP request.
#[derive(Debug, Clone, Copy)]
pub struct PresetAnswer(pub bool);

#[async_trait]
impl ConfirmationPrompt for PresetAnswer {
    async fn confirm(&self, title: &str, _message: &str) -> bool {
        tracing::debug!(title, answer = self.0, "Answering confirmation prompt");
        self.0
    }
}
