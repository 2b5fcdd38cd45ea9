use serde::{Deserialize, Serialize};

use assistant_core::models::{CitationRecord, Message};

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct ChatSendPayload {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatSendResponse {
    pub reply: String,
}

/// Chat history in chronological order (oldest first); the client renders
/// it however it likes.
#[derive(Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub filename: String,
    pub pages: usize,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Deserialize)]
pub struct AskPayload {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub cited_pages: Vec<u32>,
    pub references: String,
}

#[derive(Serialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
    pub cited_pages: Vec<u32>,
    pub references: String,
}

impl From<&CitationRecord> for QaEntry {
    fn from(record: &CitationRecord) -> Self {
        let cited_pages: Vec<u32> = record.referenced_pages.iter().copied().collect();
        let references = page_reference_label(&cited_pages);
        Self {
            question: record.question.clone(),
            answer: record.answer.clone(),
            cited_pages,
            references,
        }
    }
}

/// Q&A history in reverse chronological order (newest first), matching the
/// document view's display.
#[derive(Serialize)]
pub struct QaHistoryResponse {
    pub entries: Vec<QaEntry>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}

/// "Page 3" for one page, "Pages 1, 3" for several. Pages are expected to
/// be sorted ascending already.
pub fn page_reference_label(pages: &[u32]) -> String {
    if pages.is_empty() {
        return String::new();
    }
    let joined = pages
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if pages.len() > 1 {
        format!("Pages {}", joined)
    } else {
        format!("Page {}", joined)
    }
}
