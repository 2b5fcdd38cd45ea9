mod handlers;
mod payloads;
mod state;

use std::sync::Arc;

use assistant_core::{
    DocumentIngestor, DocumentProcessor, Embedder, EngineConfig, GenerativeModel, OllamaClient,
    OllamaEmbedder,
};
use state::AppState;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = EngineConfig::from_env();
    log::info!(
        "Starting with chat model '{}' and embedding model '{}' at {}",
        config.chat_model,
        config.embedding_model,
        config.ollama_url
    );

    let embedder: Arc<dyn Embedder> = match OllamaEmbedder::new(&config) {
        Ok(embedder) => Arc::new(embedder),
        Err(e) => {
            eprintln!("Failed to initialize embedding client: {}", e);
            std::process::exit(1);
        }
    };
    let llm: Arc<dyn GenerativeModel> = match OllamaClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to initialize Ollama client: {}", e);
            std::process::exit(1);
        }
    };
    let processor: Arc<dyn DocumentIngestor> = Arc::new(DocumentProcessor::new());

    let bind_addr = config.bind_addr.clone();
    let app = handlers::router(AppState::new(config, embedder, llm, processor));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    println!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
