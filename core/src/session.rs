use crate::index::VectorIndex;
use crate::models::{CitationRecord, Message};

/// Opening line seeded into every fresh conversation.
pub const GREETING: &str = "Hi! I'm here to help. What would you like to discuss?";

/// The one live document for a session: its index replaces any previous
/// document wholesale when a new upload succeeds.
#[derive(Debug)]
pub struct DocumentState {
    pub filename: String,
    pub page_count: usize,
    pub index: VectorIndex,
}

/// All mutable state for one session, passed explicitly to every operation.
/// The chat conversation and the document Q&A side are independent: each
/// has its own history and its own reset.
#[derive(Debug)]
pub struct SessionContext {
    pub conversation: Vec<Message>,
    pub document: Option<DocumentState>,
    pub qa_history: Vec<CitationRecord>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            conversation: vec![Message::assistant(GREETING)],
            document: None,
            qa_history: Vec::new(),
        }
    }

    /// Resets the chat to the same state a fresh session starts in.
    pub fn clear_conversation(&mut self) {
        self.conversation = vec![Message::assistant(GREETING)];
    }

    pub fn clear_qa_history(&mut self) {
        self.qa_history.clear();
    }

    /// Replaces the live document. Callers build the new state completely
    /// before calling this, so a failed ingestion never leaves the session
    /// half-overwritten.
    pub fn install_document(&mut self, document: DocumentState) {
        log::info!(
            "Installing document '{}' ({} pages, {} chunks)",
            document.filename,
            document.page_count,
            document.index.len()
        );
        self.document = Some(document);
    }

    pub fn record_answer(&mut self, record: CitationRecord) {
        self.qa_history.push(record);
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::BTreeSet;

    #[test]
    fn fresh_session_has_greeting_only() {
        let session = SessionContext::new();
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.conversation[0].role, Role::Assistant);
        assert_eq!(session.conversation[0].content, GREETING);
        assert!(session.document.is_none());
        assert!(session.qa_history.is_empty());
    }

    #[test]
    fn clear_conversation_resets_to_greeting() {
        let mut session = SessionContext::new();
        session.conversation.push(Message::user("hello"));
        session.conversation.push(Message::assistant("hi"));
        session.clear_conversation();
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.conversation[0].content, GREETING);
    }

    #[test]
    fn clear_qa_history_keeps_document() {
        let mut session = SessionContext::new();
        session.install_document(DocumentState {
            filename: "report.pdf".to_string(),
            page_count: 2,
            index: VectorIndex::empty(),
        });
        session.record_answer(CitationRecord {
            question: "q".to_string(),
            answer: "a".to_string(),
            referenced_pages: BTreeSet::from([1]),
        });
        session.clear_qa_history();
        assert!(session.qa_history.is_empty());
        assert!(session.document.is_some());
    }

    #[test]
    fn install_document_replaces_previous() {
        let mut session = SessionContext::new();
        session.install_document(DocumentState {
            filename: "first.pdf".to_string(),
            page_count: 1,
            index: VectorIndex::empty(),
        });
        session.install_document(DocumentState {
            filename: "second.pdf".to_string(),
            page_count: 3,
            index: VectorIndex::empty(),
        });
        assert_eq!(session.document.as_ref().unwrap().filename, "second.pdf");
    }
}
