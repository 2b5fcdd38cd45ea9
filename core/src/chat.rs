use anyhow::Result;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::llm::GenerativeModel;
use crate::models::Message;
use crate::prompt::assemble_chat_messages;
use crate::session::SessionContext;

/// Chat-tab flow: record the user turn, assemble the (possibly truncated)
/// history into a prompt, and append exactly one assistant reply.
pub struct ChatService {
    llm: Arc<dyn GenerativeModel>,
    temperature: f32,
    token_budget: usize,
}

impl ChatService {
    pub fn new(llm: Arc<dyn GenerativeModel>, config: &EngineConfig) -> Self {
        Self {
            llm,
            temperature: config.chat_temperature,
            token_budget: config.history_token_budget,
        }
    }

    /// The user message is recorded before the model call, so a failed
    /// generation leaves it in place and a retry reuses the same prompt
    /// without duplicating the turn.
    pub async fn respond(&self, session: &mut SessionContext, user_text: String) -> Result<String> {
        session.conversation.push(Message::user(user_text));

        let messages = assemble_chat_messages(&session.conversation, self.token_budget)?;
        let reply = self.llm.chat(&messages, self.temperature).await?;

        session.conversation.push(Message::assistant(reply.clone()));
        Ok(reply)
    }
}
