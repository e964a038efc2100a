//! Question answering and quiz generation over the corpus.

use super::quiz::{parse_quiz, QuizOutcome};
use super::{Intent, Language, PromptAssembler};
use crate::config::{Prompts, RetrievalSettings};
use crate::corpus::{Corpus, ScoredPassage};
use crate::embedding::Embedder;
use crate::error::{Result, SigmaError};
use crate::generation::Generator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A cited passage returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub title: String,
    pub number: i64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub score: f32,
}

impl From<ScoredPassage> for Match {
    fn from(scored: ScoredPassage) -> Self {
        let passage = scored.passage;
        Self {
            title: passage.title,
            number: passage.number,
            start: passage.start,
            end: passage.end,
            text: passage.text,
            score: scored.score,
        }
    }
}

/// A generated answer with the passages it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub matches: Vec<Match>,
}

/// RAG engine for question answering.
pub struct RagEngine {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    assembler: PromptAssembler,
    retrieval: RetrievalSettings,
}

impl RagEngine {
    /// Create a new RAG engine with default retrieval limits.
    pub fn new(
        corpus: Arc<Corpus>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        prompts: Prompts,
    ) -> Self {
        Self {
            corpus,
            embedder,
            generator,
            assembler: PromptAssembler::new(prompts),
            retrieval: RetrievalSettings::default(),
        }
    }

    /// Override how many passages are retrieved and how many quiz questions are asked for.
    pub fn with_retrieval(mut self, retrieval: RetrievalSettings) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Embed `query` and return the `k` most similar passages.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredPassage>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self.corpus.rank(&embedding, k)?;
        debug!("Retrieved {} passages", results.len());
        Ok(results)
    }

    /// Answer a question from the best matching passages.
    ///
    /// A blank question is answered with a prompt to type one, without
    /// touching the embedding or generation providers.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str, language: Language, intent: Intent) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(Answer {
                answer: SigmaError::EmptyQuestion.to_string(),
                matches: Vec::new(),
            });
        }

        info!("Processing question ({}, {:?})", language.code(), intent);

        let passages = self.search(question, self.retrieval.answer_top_k).await?;
        let prompt = self.assembler.assemble(question, &passages, language, intent);
        let answer = self.generator.generate(&prompt).await?;

        Ok(Answer {
            answer,
            matches: passages.into_iter().map(Match::from).collect(),
        })
    }

    /// Generate a multiple-choice quiz about a topic.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn quiz(&self, question: &str, language: Language) -> Result<QuizOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(QuizOutcome::Unparsed("Empty question.".to_string()));
        }

        let passages = self.search(question, self.retrieval.quiz_top_k).await?;
        let prompt = self.assembler.assemble_quiz(
            question,
            &passages,
            language,
            self.retrieval.quiz_questions,
        );
        let raw = self.generator.generate(&prompt).await?;

        let outcome = parse_quiz(&raw);
        match &outcome {
            QuizOutcome::Parsed(items) => info!("Generated {} quiz questions", items.len()),
            QuizOutcome::Unparsed(_) => info!("Quiz output was not valid JSON, returning raw text"),
        }
        Ok(outcome)
    }
}
