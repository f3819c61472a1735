use std::sync::Arc;

use finquery_core::FinQueryResult;
use finquery_model::CompletionClient;
use tracing::{debug, info};

use crate::retriever::{Retriever, DEFAULT_RETRIEVAL_LIMIT};

/// Answer returned when no completion client is configured. The
/// degraded state is stated explicitly instead of returning an empty
/// answer.
pub const MODEL_DISABLED_ANSWER: &str = "I'm unable to generate a synthesized answer because the \
     language model is currently disabled. Configure a model credential to enable full answers.";

/// A composed answer: the synthesized (or disabled-mode) answer text,
/// the retrieved context it was grounded on, and whether a model
/// produced it.
#[derive(Debug, Clone)]
pub struct ComposedAnswer {
    pub answer: String,
    pub context: Vec<String>,
    pub model_used: bool,
}

/// Composes answers over retrieved context.
///
/// Without a completion client, returns the retrieved chunks with the
/// static disabled-mode answer. With one, builds a grounding prompt and
/// delegates a single-turn completion; client failures propagate — they
/// are never rewritten into the disabled-mode answer.
pub struct AnswerComposer {
    retriever: Retriever,
    completion: Option<Arc<dyn CompletionClient>>,
}

impl AnswerComposer {
    pub fn new(retriever: Retriever, completion: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            retriever,
            completion,
        }
    }

    /// Answer `question` from the stored corpus.
    pub async fn compose(&self, question: &str) -> FinQueryResult<ComposedAnswer> {
        let retrieval = self
            .retriever
            .retrieve(question, DEFAULT_RETRIEVAL_LIMIT)
            .await?;
        let context = retrieval.chunks;
        debug!(chunks = context.len(), tier = ?retrieval.tier, "Context retrieved");

        let Some(completion) = &self.completion else {
            info!("Composing in degraded mode (no model configured)");
            return Ok(ComposedAnswer {
                answer: MODEL_DISABLED_ANSWER.to_string(),
                context,
                model_used: false,
            });
        };

        let prompt = build_grounding_prompt(question, &context);
        let answer = completion.complete(&prompt).await?;

        Ok(ComposedAnswer {
            answer,
            context,
            model_used: true,
        })
    }
}

/// Build the grounding prompt: the retrieved chunks as context, the
/// literal question, and the instruction to answer only from context.
pub fn build_grounding_prompt(question: &str, context: &[String]) -> String {
    format!(
        "You are a financial assistant answering questions strictly using the provided context.\n\
         \n\
         Context:\n\
         {}\n\
         \n\
         Question:\n\
         {}\n\
         \n\
         Instructions:\n\
         - Answer clearly and concisely\n\
         - If the answer is not present in the context, say so\n",
        context.join("\n\n"),
        question
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use finquery_core::{DocumentChunk, FinQueryError};
    use finquery_store::{ContentStore, InMemoryContentStore, StorePool};
    use tokio::sync::Mutex;

    struct RecordingCompletion {
        reply: FinQueryResult<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingCompletion {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(FinQueryError::Model(message.to_string())),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for RecordingCompletion {
        async fn complete(&self, prompt: &str) -> FinQueryResult<String> {
            self.prompts.lock().await.push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(FinQueryError::Model(msg)) => Err(FinQueryError::Model(msg.clone())),
                Err(_) => unreachable!(),
            }
        }
    }

    async fn retriever_over(contents: &[&str]) -> Retriever {
        let store = InMemoryContentStore::new();
        for content in contents {
            store
                .insert_chunk(DocumentChunk::new(*content, None))
                .await
                .unwrap();
        }
        Retriever::new(Arc::new(StorePool::new(Arc::new(store), 2)), None)
    }

    #[tokio::test]
    async fn test_degraded_mode_returns_marker_and_context() {
        let retriever = retriever_over(&["Moat investing is about durable advantages"]).await;
        let composer = AnswerComposer::new(retriever.clone(), None);

        let composed = composer.compose("What is moat investing?").await.unwrap();
        assert!(!composed.model_used);
        assert_eq!(composed.answer, MODEL_DISABLED_ANSWER);

        // Context equals the retriever's own output for the question.
        let retrieval = retriever
            .retrieve("What is moat investing?", DEFAULT_RETRIEVAL_LIMIT)
            .await
            .unwrap();
        assert_eq!(composed.context, retrieval.chunks);
    }

    #[tokio::test]
    async fn test_prompt_contains_context_and_question() {
        let retriever = retriever_over(&["Context A", "Context B"]).await;
        let completion = Arc::new(RecordingCompletion::replying("Synthesized."));
        let composer = AnswerComposer::new(retriever, Some(Arc::clone(&completion) as _));

        let composed = composer.compose("What does Context say?").await.unwrap();
        assert!(composed.model_used);
        assert_eq!(composed.answer, "Synthesized.");
        assert_eq!(composed.context, vec!["Context A", "Context B"]);

        let prompts = completion.prompts.lock().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context A"));
        assert!(prompts[0].contains("Context B"));
        assert!(prompts[0].contains("What does Context say?"));
        assert!(prompts[0].contains("If the answer is not present in the context"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_valid() {
        let retriever = retriever_over(&["Some context"]).await;
        let completion = Arc::new(RecordingCompletion::replying(""));
        let composer = AnswerComposer::new(retriever, Some(completion as _));

        let composed = composer.compose("context?").await.unwrap();
        assert!(composed.model_used);
        assert_eq!(composed.answer, "");
    }

    #[tokio::test]
    async fn test_model_failure_propagates_not_downgraded() {
        let retriever = retriever_over(&["Some context"]).await;
        let completion = Arc::new(RecordingCompletion::failing("quota exceeded"));
        let composer = AnswerComposer::new(retriever, Some(completion as _));

        let err = composer.compose("context?").await.unwrap_err();
        match err {
            FinQueryError::Model(msg) => assert!(msg.contains("quota exceeded")),
            other => panic!("expected Model error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_matching_context_still_composes() {
        let retriever = retriever_over(&["Unrelated chunk"]).await;
        let composer = AnswerComposer::new(retriever, None);

        let composed = composer.compose("zzz-no-match").await.unwrap();
        assert!(composed.context.is_empty());
        assert!(!composed.model_used);
        assert!(!composed.answer.is_empty());
    }
}
