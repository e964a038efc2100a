//! Corpus snapshot persistence.
//!
//! The snapshot is rewritten wholesale on every save. Embeddings are stored as
//! little-endian `f32` blobs and times as SQLite `REAL`, so a save/load cycle is
//! bit-exact.

use super::{Passage, PassageSource};
use crate::error::{Result, SigmaError};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Persistent home of the full passage collection.
pub trait SnapshotStore: Send + Sync {
    /// Load every passage in corpus order.
    fn load(&self) -> Result<Vec<Passage>>;

    /// Replace the stored collection with `passages`.
    fn save(&self, passages: &[Passage]) -> Result<()>;
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS passages (
        position INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        number INTEGER NOT NULL,
        start_seconds REAL NOT NULL,
        end_seconds REAL NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL,
        source TEXT NOT NULL
    );
"#;

/// SQLite-backed snapshot.
pub struct SqliteSnapshot {
    conn: Mutex<Connection>,
}

impl SqliteSnapshot {
    /// Open (or create) a snapshot file.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened corpus snapshot at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory snapshot (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SigmaError::Snapshot("snapshot connection lock poisoned".to_string()))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
        if bytes.len() % 4 != 0 {
            return Err(SigmaError::Snapshot(format!(
                "embedding blob of {} bytes is not a whole number of f32 values",
                bytes.len()
            )));
        }

        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect())
    }
}

impl SnapshotStore for SqliteSnapshot {
    fn load(&self) -> Result<Vec<Passage>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT title, number, start_seconds, end_seconds, text, embedding, source
             FROM passages ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Vec<u8>>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut passages = Vec::new();
        for row in rows {
            let (title, number, start, end, text, embedding, source) = row?;
            passages.push(Passage {
                title,
                number,
                start,
                end,
                text,
                embedding: Self::bytes_to_embedding(&embedding)?,
                source: source.parse::<PassageSource>().map_err(SigmaError::Snapshot)?,
            });
        }

        debug!("Loaded {} passages", passages.len());
        Ok(passages)
    }

    #[instrument(skip_all, fields(count = passages.len()))]
    fn save(&self, passages: &[Passage]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM passages", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO passages
                 (position, title, number, start_seconds, end_seconds, text, embedding, source)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for (position, passage) in passages.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    passage.title,
                    passage.number,
                    passage.start,
                    passage.end,
                    passage.text,
                    Self::embedding_to_bytes(&passage.embedding),
                    passage.source.as_str(),
                ])?;
            }
        }
        tx.commit()?;

        debug!("Saved {} passages", passages.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::USER_VIDEO_NUMBER;

    fn sample() -> Vec<Passage> {
        vec![
            Passage {
                title: "Video 12 - Flexbox".to_string(),
                number: 12,
                start: 0.1 + 0.2,
                end: 1e-7,
                text: "display: flex turns a container into a flex container".to_string(),
                embedding: vec![0.1, -0.0, f32::MIN_POSITIVE / 2.0, 3.402_823_5e38, -1.5e-45],
                source: PassageSource::Course,
            },
            Passage {
                title: "मेरा वीडियो.mp4".to_string(),
                number: USER_VIDEO_NUMBER,
                start: 12345.678_901_234_5,
                end: 12350.0,
                text: "यह एक परीक्षण है".to_string(),
                embedding: vec![1.0 / 3.0, 2.0 / 3.0, 0.0, 1.0, -1.0],
                source: PassageSource::UserVideo,
            },
        ]
    }

    #[test]
    fn test_roundtrip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.db");
        let original = sample();

        SqliteSnapshot::new(&path).unwrap().save(&original).unwrap();
        let loaded = SqliteSnapshot::new(&path).unwrap().load().unwrap();

        assert_eq!(loaded.len(), original.len());
        for (a, b) in original.iter().zip(loaded.iter()) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.number, b.number);
            assert_eq!(a.text, b.text);
            assert_eq!(a.source, b.source);
            assert_eq!(a.start.to_bits(), b.start.to_bits());
            assert_eq!(a.end.to_bits(), b.end.to_bits());
            let bits_a: Vec<u32> = a.embedding.iter().map(|f| f.to_bits()).collect();
            let bits_b: Vec<u32> = b.embedding.iter().map(|f| f.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let store = SqliteSnapshot::in_memory().unwrap();
        let mut passages = sample();
        store.save(&passages).unwrap();

        passages.remove(0);
        store.save(&passages).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].source, PassageSource::UserVideo);
    }

    #[test]
    fn test_empty_snapshot_loads_empty() {
        let store = SqliteSnapshot::in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_embedding_blob_is_rejected() {
        assert!(SqliteSnapshot::bytes_to_embedding(&[0, 0, 128]).is_err());
        assert_eq!(SqliteSnapshot::bytes_to_embedding(&[]).unwrap(), Vec::<f32>::new());
    }
}
