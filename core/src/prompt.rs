use anyhow::Result;
use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::models::{Message, OllamaMessage};

/// Loading the BPE table is expensive, so it is built once and shared
/// across every chat turn.
fn tokenizer() -> Result<&'static CoreBPE> {
    static BPE: OnceLock<CoreBPE> = OnceLock::new();
    if let Some(bpe) = BPE.get() {
        return Ok(bpe);
    }
    let bpe = cl100k_base()?;
    Ok(BPE.get_or_init(|| bpe))
}

/// Turns the conversation into the ordered role-tagged message list sent to
/// the chat endpoint, evicting oldest turns first until the history fits
/// `token_budget`. The newest message is always kept, even if it alone
/// exceeds the budget, so the user's current turn is never dropped.
pub fn assemble_chat_messages(
    history: &[Message],
    token_budget: usize,
) -> Result<Vec<OllamaMessage>> {
    let bpe = tokenizer()?;

    let mut kept: Vec<OllamaMessage> = Vec::new();
    let mut total_tokens = 0usize;
    for message in history.iter().rev() {
        let cost = bpe.encode_with_special_tokens(&message.content).len();
        if !kept.is_empty() && total_tokens + cost > token_budget {
            log::info!(
                "Truncated chat history to {} of {} messages ({} tokens)",
                kept.len(),
                history.len(),
                total_tokens
            );
            break;
        }
        total_tokens += cost;
        kept.push(OllamaMessage::from(message));
    }

    kept.reverse();
    Ok(kept)
}
