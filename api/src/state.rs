use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use assistant_core::{
    ChatService, DocumentIngestor, DocumentResponder, Embedder, EngineConfig, GenerativeModel,
    SessionContext,
};

/// Shared application state. Each session's context sits behind its own
/// mutex: one action runs to completion at a time per session, while
/// different sessions proceed independently.
#[derive(Clone)]
pub struct AppState {
    pub config: EngineConfig,
    pub chat: Arc<ChatService>,
    pub responder: Arc<DocumentResponder>,
    pub processor: Arc<dyn DocumentIngestor>,
    pub embedder: Arc<dyn Embedder>,
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<SessionContext>>>>>,
}

impl AppState {
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn GenerativeModel>,
        processor: Arc<dyn DocumentIngestor>,
    ) -> Self {
        let chat = Arc::new(ChatService::new(llm.clone(), &config));
        let responder = Arc::new(DocumentResponder::new(embedder.clone(), llm, &config));
        Self {
            config,
            chat,
            responder,
            processor,
            embedder,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(
            session_id.clone(),
            Arc::new(Mutex::new(SessionContext::new())),
        );
        log::info!("Created session {}", session_id);
        session_id
    }

    pub async fn session(&self, session_id: &str) -> Option<Arc<Mutex<SessionContext>>> {
        self.sessions.read().await.get(session_id).cloned()
    }
}
