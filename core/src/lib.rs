pub mod chat;
pub mod chunker;
pub mod config;
pub mod document_processor;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod responder;
pub mod session;

pub use chat::ChatService;
pub use chunker::chunk_pages;
pub use config::EngineConfig;
pub use document_processor::{DocumentIngestor, DocumentProcessor, OcrEngine, TesseractOcr};
pub use embedding::{Embedder, OllamaEmbedder};
pub use index::{SearchHit, VectorIndex};
pub use llm::{GenerativeModel, OllamaClient};
pub use models::*;
pub use responder::DocumentResponder;
pub use session::{DocumentState, SessionContext, GREETING};
