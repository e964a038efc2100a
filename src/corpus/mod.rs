//! The passage corpus and similarity ranking.
//!
//! A [`Corpus`] is the single shared, mutable collection of embedded passages.
//! Readers take a cheap copy-on-write view (`Arc<Vec<Passage>>`) and rank
//! against it without holding any lock; writers are serialized, persist the
//! full snapshot, and only then publish the new view.

mod snapshot;

pub use snapshot::{SnapshotStore, SqliteSnapshot};

use crate::error::{Result, SigmaError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, instrument};

/// Video number used for passages that came from user uploads.
pub const USER_VIDEO_NUMBER: i64 = -1;

/// Where a passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PassageSource {
    /// Part of the curated course.
    #[default]
    Course,
    /// Uploaded by a user at runtime.
    UserVideo,
}

impl PassageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassageSource::Course => "course",
            PassageSource::UserVideo => "user_video",
        }
    }
}

impl std::str::FromStr for PassageSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "course" => Ok(PassageSource::Course),
            "user_video" => Ok(PassageSource::UserVideo),
            _ => Err(format!("Unknown passage source: {}", s)),
        }
    }
}

impl std::fmt::Display for PassageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transcript excerpt with its embedding; the unit of retrieval and citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Source video title.
    pub title: String,
    /// Video number in the course, or [`USER_VIDEO_NUMBER`].
    pub number: i64,
    /// Start of the passage in seconds.
    pub start: f64,
    /// End of the passage in seconds.
    pub end: f64,
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub source: PassageSource,
}

/// A passage with its similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredPassage {
    pub passage: Passage,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Per-video summary of the corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub title: String,
    pub number: i64,
    pub source: PassageSource,
    pub chunk_count: usize,
    /// Largest passage end time seen for the video.
    pub duration_seconds: f64,
}

/// Compute cosine similarity between two vectors.
///
/// Zero-magnitude inputs and non-finite results score `0.0` instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        debug!("Zero-magnitude embedding, scoring 0");
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !score.is_finite() {
        debug!("Non-finite similarity, scoring 0");
        return 0.0;
    }

    score.clamp(-1.0, 1.0) as f32
}

/// Rank passages by cosine similarity to `query`, highest first, keeping at most `k`.
///
/// Equal scores keep their corpus order.
pub fn rank(passages: &[Passage], query: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
    if passages.is_empty() || k == 0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(usize, f32)> = Vec::with_capacity(passages.len());
    for (idx, passage) in passages.iter().enumerate() {
        if passage.embedding.len() != query.len() {
            return Err(SigmaError::DimensionMismatch {
                expected: passage.embedding.len(),
                found: query.len(),
            });
        }
        scored.push((idx, cosine_similarity(query, &passage.embedding)));
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(idx, score)| ScoredPassage {
            passage: passages[idx].clone(),
            score,
        })
        .collect())
}

/// The shared passage collection.
pub struct Corpus {
    passages: RwLock<Arc<Vec<Passage>>>,
    writer: Mutex<()>,
    store: Box<dyn SnapshotStore>,
}

impl Corpus {
    /// Load the corpus from its snapshot store.
    #[instrument(skip_all)]
    pub fn open(store: Box<dyn SnapshotStore>) -> Result<Self> {
        let passages = store.load()?;
        check_dimensions(None, &passages)?;
        info!("Loaded {} passages from snapshot", passages.len());

        Ok(Self {
            passages: RwLock::new(Arc::new(passages)),
            writer: Mutex::new(()),
            store,
        })
    }

    /// Current immutable view of all passages.
    pub fn view(&self) -> Arc<Vec<Passage>> {
        let guard = self.passages.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    /// Embedding dimensionality, once the corpus holds a passage.
    pub fn dimensions(&self) -> Option<usize> {
        self.view().first().map(|p| p.embedding.len())
    }

    /// Top-`k` passages for a query embedding.
    pub fn rank(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage>> {
        rank(&self.view(), query, k)
    }

    /// Append passages and persist the whole corpus. Returns the new size.
    ///
    /// Appends are serialized. The in-memory view changes only after the
    /// snapshot was written; on any error the corpus is left untouched.
    #[instrument(skip_all, fields(count = new_passages.len()))]
    pub fn append(&self, new_passages: Vec<Passage>) -> Result<usize> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.view();
        let expected = current.first().map(|p| p.embedding.len());
        check_dimensions(expected, &new_passages)?;
        if let Some(p) = new_passages.iter().find(|p| p.text.trim().is_empty()) {
            return Err(SigmaError::InvalidInput(format!(
                "Passage '{}' at {}s has no text",
                p.title, p.start
            )));
        }

        let mut next = Vec::with_capacity(current.len() + new_passages.len());
        next.extend(current.iter().cloned());
        next.extend(new_passages);

        self.store.save(&next)?;

        let total = next.len();
        *self.passages.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        info!("Corpus now holds {} passages", total);
        Ok(total)
    }

    /// Passages grouped by source video, in order of first appearance.
    pub fn videos(&self) -> Vec<VideoSummary> {
        let view = self.view();
        let mut index: HashMap<(&str, i64, PassageSource), usize> = HashMap::new();
        let mut videos: Vec<VideoSummary> = Vec::new();

        for passage in view.iter() {
            let key = (passage.title.as_str(), passage.number, passage.source);
            let slot = *index.entry(key).or_insert_with(|| {
                videos.push(VideoSummary {
                    title: passage.title.clone(),
                    number: passage.number,
                    source: passage.source,
                    chunk_count: 0,
                    duration_seconds: 0.0,
                });
                videos.len() - 1
            });

            let video = &mut videos[slot];
            video.chunk_count += 1;
            video.duration_seconds = video.duration_seconds.max(passage.end);
        }

        videos
    }
}

/// Every passage must carry a non-empty embedding of the same length.
fn check_dimensions(expected: Option<usize>, passages: &[Passage]) -> Result<()> {
    let expected = match expected.or_else(|| passages.first().map(|p| p.embedding.len())) {
        Some(dim) => dim,
        None => return Ok(()),
    };

    if expected == 0 {
        return Err(SigmaError::Corpus("Passage has an empty embedding".to_string()));
    }

    match passages.iter().find(|p| p.embedding.len() != expected) {
        Some(p) => Err(SigmaError::DimensionMismatch {
            expected,
            found: p.embedding.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::passage;

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn load(&self) -> Result<Vec<Passage>> {
            Ok(Vec::new())
        }

        fn save(&self, _passages: &[Passage]) -> Result<()> {
            Err(SigmaError::Snapshot("disk full".to_string()))
        }
    }

    fn memory_corpus(passages: Vec<Passage>) -> Corpus {
        let store = SqliteSnapshot::in_memory().unwrap();
        store.save(&passages).unwrap();
        Corpus::open(Box::new(store)).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_degenerate_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_by_score() {
        let passages = vec![
            passage("CSS", 1, "far", vec![0.0, 1.0]),
            passage("HTML", 2, "near", vec![1.0, 0.1]),
            passage("JS", 3, "middle", vec![1.0, 1.0]),
        ];

        let ranked = rank(&passages, &[1.0, 0.0], 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].passage.text, "near");
        assert_eq!(ranked[1].passage.text, "middle");
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_rank_edge_cases() {
        assert!(rank(&[], &[1.0, 0.0], 5).unwrap().is_empty());

        let passages = vec![passage("A", 1, "a", vec![1.0, 0.0])];
        assert!(rank(&passages, &[1.0, 0.0], 0).unwrap().is_empty());
        assert_eq!(rank(&passages, &[1.0, 0.0], 10).unwrap().len(), 1);
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let passages: Vec<Passage> = (0..6)
            .map(|i| passage("Same", i, &format!("p{}", i), vec![2.0, 2.0]))
            .collect();

        let ranked = rank(&passages, &[1.0, 1.0], 6).unwrap();
        let order: Vec<i64> = ranked.iter().map(|r| r.passage.number).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rank_zero_magnitude_passage_sinks_below_positive_matches() {
        let passages = vec![
            passage("Zero", 1, "zero", vec![0.0, 0.0]),
            passage("Hit", 2, "hit", vec![1.0, 0.0]),
        ];
        let ranked = rank(&passages, &[1.0, 0.0], 2).unwrap();
        assert_eq!(ranked[0].passage.text, "hit");
        assert_eq!(ranked[1].score, 0.0);
    }

    #[test]
    fn test_rank_rejects_wrong_query_dimension() {
        let passages = vec![passage("A", 1, "a", vec![1.0, 0.0])];
        let err = rank(&passages, &[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, SigmaError::DimensionMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn test_append_persists_and_publishes() {
        let corpus = memory_corpus(vec![passage("A", 1, "a", vec![1.0, 0.0])]);
        assert_eq!(corpus.len(), 1);

        let before = corpus.view();
        let total = corpus
            .append(vec![passage("B", 2, "b", vec![0.0, 1.0])])
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(corpus.len(), 2);
        // Views taken earlier are not affected by later writes.
        assert_eq!(before.len(), 1);
        assert_eq!(corpus.store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_append_rejects_mismatched_dimensions() {
        let corpus = memory_corpus(vec![passage("A", 1, "a", vec![1.0, 0.0])]);
        let err = corpus
            .append(vec![passage("B", 2, "b", vec![0.0, 1.0, 0.0])])
            .unwrap_err();

        assert!(matches!(err, SigmaError::DimensionMismatch { .. }));
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn test_append_rejects_empty_text() {
        let corpus = memory_corpus(Vec::new());
        let err = corpus
            .append(vec![passage("A", 1, "  ", vec![1.0, 0.0])])
            .unwrap_err();

        assert!(matches!(err, SigmaError::InvalidInput(_)));
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_failed_save_leaves_corpus_untouched() {
        let corpus = Corpus::open(Box::new(BrokenStore)).unwrap();
        let err = corpus
            .append(vec![passage("A", 1, "a", vec![1.0, 0.0])])
            .unwrap_err();

        assert!(matches!(err, SigmaError::Snapshot(_)));
        assert!(corpus.is_empty());
        assert_eq!(corpus.dimensions(), None);
    }

    #[test]
    fn test_concurrent_readers_see_whole_batches() {
        let corpus = Arc::new(memory_corpus(Vec::new()));

        let writer = {
            let corpus = Arc::clone(&corpus);
            std::thread::spawn(move || {
                for batch in 0..20 {
                    let passages = (0..5)
                        .map(|i| passage("T", batch, &format!("{}-{}", batch, i), vec![1.0, 0.0]))
                        .collect();
                    corpus.append(passages).unwrap();
                }
            })
        };

        for _ in 0..200 {
            assert_eq!(corpus.len() % 5, 0);
        }
        writer.join().unwrap();
        assert_eq!(corpus.len(), 100);
    }

    #[test]
    fn test_videos_groups_passages() {
        let mut upload = passage("my clip.mp4", USER_VIDEO_NUMBER, "u", vec![1.0, 0.0]);
        upload.source = PassageSource::UserVideo;
        upload.end = 42.0;

        let corpus = memory_corpus(vec![
            passage("Intro", 1, "a", vec![1.0, 0.0]),
            upload,
            passage("Intro", 1, "b", vec![0.0, 1.0]),
        ]);

        let videos = corpus.videos();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].title, "Intro");
        assert_eq!(videos[0].chunk_count, 2);
        assert_eq!(videos[1].source, PassageSource::UserVideo);
        assert_eq!(videos[1].duration_seconds, 42.0);
    }

    #[test]
    fn test_passage_source_serde() {
        let json = serde_json::to_string(&PassageSource::UserVideo).unwrap();
        assert_eq!(json, "\"user_video\"");
        assert_eq!("course".parse::<PassageSource>().unwrap(), PassageSource::Course);
    }
}
