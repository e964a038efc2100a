//! Configuration settings for Sigma.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub course: CourseSettings,
    pub corpus: CorpusSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub transcription: TranscriptionSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
    /// Timeout applied to every call to an external provider.
    pub request_timeout_secs: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.sigma".to_string(),
            log_level: "warn".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Describes the course the corpus was built from. Both values are exposed to
/// prompt templates as `{{course}}` and `{{domain}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseSettings {
    pub name: String,
    pub domain: String,
}

impl Default for CourseSettings {
    fn default() -> Self {
        Self {
            name: "Sigma Web Development Course".to_string(),
            domain: "web development".to_string(),
        }
    }
}

/// Corpus snapshot and upload storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// SQLite file holding the full passage collection.
    pub snapshot_path: String,
    /// Directory where uploaded media is kept.
    pub upload_dir: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            snapshot_path: "~/.sigma/corpus.db".to_string(),
            upload_dir: "~/.sigma/user_videos".to_string(),
        }
    }
}

/// External model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server.
    #[default]
    Ollama,
    /// OpenAI API (reads `OPENAI_API_KEY`).
    OpenAI,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: Provider,
    /// Embedding model name.
    pub model: String,
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Requested dimensions (OpenAI only; Ollama models have a fixed size).
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: "bge-m3".to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimensions: None,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub provider: Provider,
    /// LLM used for answers and quizzes.
    pub model: String,
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Sampling temperature. `None` keeps the provider default.
    pub temperature: Option<f32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: "llama3.2".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: None,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language hint passed to Whisper (ISO-639-1). Auto-detected when unset.
    pub language: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum characters per merged chunk.
    pub max_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_chars: crate::chunking::DEFAULT_MAX_CHARS,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Passages handed to the model when answering.
    pub answer_top_k: usize,
    /// Passages handed to the model when writing a quiz.
    pub quiz_top_k: usize,
    /// Number of questions requested per quiz.
    pub quiz_questions: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            answer_top_k: 5,
            quiz_top_k: 8,
            quiz_questions: 5,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. `*` allows any origin.
    pub allowed_origins: Vec<String>,
    /// Maximum upload body size in megabytes.
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            max_upload_mb: 1024,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SigmaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sigma")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded corpus snapshot path.
    pub fn snapshot_path(&self) -> PathBuf {
        Self::expand_path(&self.corpus.snapshot_path)
    }

    /// Get the expanded upload directory path.
    pub fn upload_dir(&self) -> PathBuf {
        Self::expand_path(&self.corpus.upload_dir)
    }

    /// Timeout for provider calls.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.general.request_timeout_secs)
    }

    /// Variables made available to every prompt template. Values from
    /// `prompts.variables` override the course defaults.
    pub fn prompt_variables(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("course".to_string(), self.course.name.clone());
        vars.insert("domain".to_string(), self.course.domain.clone());
        for (key, value) in &self.prompts.variables {
            vars.insert(key.clone(), value.clone());
        }
        vars
    }
}
