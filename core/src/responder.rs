use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::llm::GenerativeModel;

/// Retrieval-augmented answering: embed the question, pull the top-k
/// chunks, and ask the model to answer from that context with page
/// citations. The returned page set is derived from retrieval, not parsed
/// from the model's prose.
pub struct DocumentResponder {
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn GenerativeModel>,
    top_k: usize,
    temperature: f32,
    max_answer_tokens: u32,
}

impl DocumentResponder {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn GenerativeModel>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            embedder,
            llm,
            top_k: config.top_k,
            temperature: config.doc_temperature,
            max_answer_tokens: config.max_answer_tokens,
        }
    }

    /// An empty or unindexed document yields an empty context block; the
    /// prompt is still sent and the model answers from nothing.
    pub async fn answer(
        &self,
        question: &str,
        index: &VectorIndex,
    ) -> Result<(String, BTreeSet<u32>)> {
        let query_embedding = self.embedder.embed(question).await?;
        let hits = index.search(&query_embedding, self.top_k);

        let mut context = String::new();
        let mut cited_pages = BTreeSet::new();
        for hit in &hits {
            if let Some(chunk) = index.get(hit.ordinal) {
                context.push_str(&format!("[Page {}]: {}\n", chunk.page_number, chunk.text));
                cited_pages.insert(chunk.page_number);
            }
        }
        log::info!("Retrieved {} chunks for question", hits.len());

        let prompt = build_answer_prompt(&context, question);
        let answer = self
            .llm
            .generate(&prompt, self.temperature, self.max_answer_tokens)
            .await?;

        Ok((answer, cited_pages))
    }
}

fn build_answer_prompt(context: &str, question: &str) -> String {
    format!(
        r#"Document Context:
{context}

Question: {question}

Answer: Please provide a concise answer based on the document context.
Include references to pages in parentheses, e.g. (Page 3)."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::chunk_pages;
    use crate::models::PageText;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic bag-of-keywords embedding, dimension 4.
    struct KeywordEmbedder;

    const KEYWORDS: [&str; 4] = ["revenue", "costs", "grew", "fell"];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lowered = text.to_lowercase();
            Ok(KEYWORDS
                .iter()
                .map(|kw| if lowered.contains(kw) { 1.0 } else { 0.0 })
                .collect())
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }

    struct CapturingModel {
        prompts: Mutex<Vec<String>>,
        reply: Result<String, String>,
    }

    impl CapturingModel {
        fn answering(text: &str) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                reply: Ok(text.to_string()),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for CapturingModel {
        async fn chat(&self, _: &[crate::models::OllamaMessage], _: f32) -> Result<String> {
            unreachable!("document flow never calls chat")
        }

        async fn generate(&self, prompt: &str, _: f32, _: u32) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(reason) => Err(anyhow!("{}", reason)),
            }
        }
    }

    async fn two_page_index() -> VectorIndex {
        let pages = vec![
            PageText {
                page_number: 1,
                text: "Revenue grew 10%.".to_string(),
            },
            PageText {
                page_number: 2,
                text: "Costs fell 5%.".to_string(),
            },
        ];
        let chunks = chunk_pages(&pages, 1000, 200);
        VectorIndex::build(chunks, &KeywordEmbedder).await.unwrap()
    }

    #[tokio::test]
    async fn cites_the_page_that_answers_the_question() {
        let index = two_page_index().await;
        let llm = Arc::new(CapturingModel::answering("Revenue grew by 10% (Page 1)."));
        let responder = DocumentResponder::new(
            Arc::new(KeywordEmbedder),
            llm.clone(),
            &EngineConfig::default(),
        );

        let (answer, pages) = responder
            .answer("How did revenue change?", &index)
            .await
            .unwrap();

        assert_eq!(answer, "Revenue grew by 10% (Page 1).");
        // Page 1 must be cited; page 2 may also land in the top-k.
        assert!(pages.contains(&1));

        // Context lines appear in retrieval-rank order: page 1 first.
        let prompts = llm.prompts.lock().unwrap();
        let page1_pos = prompts[0].find("[Page 1]:").unwrap();
        if let Some(page2_pos) = prompts[0].find("[Page 2]:") {
            assert!(page1_pos < page2_pos);
        }
        assert!(prompts[0].contains("How did revenue change?"));
    }

    #[tokio::test]
    async fn empty_index_still_sends_prompt() {
        let llm = Arc::new(CapturingModel::answering("No information found."));
        let responder = DocumentResponder::new(
            Arc::new(KeywordEmbedder),
            llm.clone(),
            &EngineConfig::default(),
        );

        let (answer, pages) = responder
            .answer("Anything?", &VectorIndex::empty())
            .await
            .unwrap();

        assert_eq!(answer, "No information found.");
        assert!(pages.is_empty());
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Question: Anything?"));
    }
}
