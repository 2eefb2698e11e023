use crate::StoreError;
use crate::types::{
    Insight, InsightUpdate, Transcript, TranscriptChunk, TranscriptUpdate,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Persistence collaborator for transcripts, chunks, the metric catalog and insights.
///
/// Update methods return `Ok(None)` when the record does not exist.
pub trait Store: Send + Sync {
    fn insert_transcript(&self, transcript: &Transcript) -> Result<(), StoreError>;
    fn get_transcript(&self, id: &str) -> Result<Option<Transcript>, StoreError>;
    fn update_transcript(
        &self,
        id: &str,
        update: TranscriptUpdate,
    ) -> Result<Option<Transcript>, StoreError>;

    /// Drop every chunk stored for the transcript, then store `chunks`.
    fn replace_chunks(
        &self,
        transcript_id: &str,
        chunks: &[TranscriptChunk],
    ) -> Result<(), StoreError>;
    fn chunks(&self, transcript_id: &str) -> Result<Vec<TranscriptChunk>, StoreError>;

    fn existing_metric_names(&self) -> Result<HashSet<String>, StoreError>;

    fn create_insight(&self, insight: Insight) -> Result<Insight, StoreError>;
    fn get_insight(&self, id: &str) -> Result<Option<Insight>, StoreError>;
    fn update_insight(
        &self,
        id: &str,
        update: InsightUpdate,
    ) -> Result<Option<Insight>, StoreError>;
    fn insights(&self) -> Result<Vec<Insight>, StoreError>;

    fn insights_for_source(&self, source_id: &str) -> Result<Vec<Insight>, StoreError> {
        Ok(self
            .insights()?
            .into_iter()
            .filter(|insight| insight.sources.iter().any(|source| source.id == source_id))
            .collect())
    }
}

#[derive(Default)]
struct MemoryState {
    transcripts: HashMap<String, Transcript>,
    chunks: HashMap<String, Vec<TranscriptChunk>>,
    metric_names: HashSet<String>,
    insights: Vec<Insight>,
}

/// Process-local store, mostly for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.metric_names = names.into_iter().map(Into::into).collect();
        }
        store
    }

    pub fn add_metric_name(&self, name: impl Into<String>) -> Result<(), StoreError> {
        self.lock()?.metric_names.insert(name.into());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn insert_transcript(&self, transcript: &Transcript) -> Result<(), StoreError> {
        self.lock()?
            .transcripts
            .insert(transcript.id.clone(), transcript.clone());
        Ok(())
    }

    fn get_transcript(&self, id: &str) -> Result<Option<Transcript>, StoreError> {
        Ok(self.lock()?.transcripts.get(id).cloned())
    }

    fn update_transcript(
        &self,
        id: &str,
        update: TranscriptUpdate,
    ) -> Result<Option<Transcript>, StoreError> {
        let mut state = self.lock()?;
        Ok(state.transcripts.get_mut(id).map(|transcript| {
            update.apply(transcript);
            transcript.clone()
        }))
    }

    fn replace_chunks(
        &self,
        transcript_id: &str,
        chunks: &[TranscriptChunk],
    ) -> Result<(), StoreError> {
        self.lock()?
            .chunks
            .insert(transcript_id.to_string(), chunks.to_vec());
        Ok(())
    }

    fn chunks(&self, transcript_id: &str) -> Result<Vec<TranscriptChunk>, StoreError> {
        Ok(self
            .lock()?
            .chunks
            .get(transcript_id)
            .cloned()
            .unwrap_or_default())
    }

    fn existing_metric_names(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.lock()?.metric_names.clone())
    }

    fn create_insight(&self, insight: Insight) -> Result<Insight, StoreError> {
        self.lock()?.insights.push(insight.clone());
        Ok(insight)
    }

    fn get_insight(&self, id: &str) -> Result<Option<Insight>, StoreError> {
        Ok(self
            .lock()?
            .insights
            .iter()
            .find(|insight| insight.id == id)
            .cloned())
    }

    fn update_insight(
        &self,
        id: &str,
        update: InsightUpdate,
    ) -> Result<Option<Insight>, StoreError> {
        let mut state = self.lock()?;
        Ok(state
            .insights
            .iter_mut()
            .find(|insight| insight.id == id)
            .map(|insight| {
                update.apply(insight);
                insight.clone()
            }))
    }

    fn insights(&self) -> Result<Vec<Insight>, StoreError> {
        Ok(self.lock()?.insights.clone())
    }
}

const TRANSCRIPTS_DIR: &str = "transcripts";
const CHUNKS_DIR: &str = "chunks";
const INSIGHTS_DIR: &str = "insights";
const METRICS_FILE: &str = "metrics.json";

/// JSON documents under a data directory:
///
/// ```text
/// <dir>/transcripts/<id>.json
/// <dir>/chunks/<transcript id>.json
/// <dir>/insights/<id>.json
/// <dir>/metrics.json          tracked metric names, a JSON array of strings
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(base_dir.join(TRANSCRIPTS_DIR))?;
        fs::create_dir_all(base_dir.join(CHUNKS_DIR))?;
        fs::create_dir_all(base_dir.join(INSIGHTS_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn write_metric_names(&self, names: &HashSet<String>) -> Result<(), StoreError> {
        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();
        write_json(&self.base_dir.join(METRICS_FILE), &sorted)
    }

    fn document(&self, dir: &str, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        Ok(self.base_dir.join(dir).join(format!("{id}.json")))
    }
}

impl Store for FileStore {
    fn insert_transcript(&self, transcript: &Transcript) -> Result<(), StoreError> {
        write_json(&self.document(TRANSCRIPTS_DIR, &transcript.id)?, transcript)
    }

    fn get_transcript(&self, id: &str) -> Result<Option<Transcript>, StoreError> {
        read_json(&self.document(TRANSCRIPTS_DIR, id)?)
    }

    fn update_transcript(
        &self,
        id: &str,
        update: TranscriptUpdate,
    ) -> Result<Option<Transcript>, StoreError> {
        let path = self.document(TRANSCRIPTS_DIR, id)?;
        let Some(mut transcript) = read_json::<Transcript>(&path)? else {
            return Ok(None);
        };
        update.apply(&mut transcript);
        write_json(&path, &transcript)?;
        Ok(Some(transcript))
    }

    fn replace_chunks(
        &self,
        transcript_id: &str,
        chunks: &[TranscriptChunk],
    ) -> Result<(), StoreError> {
        let path = self.document(CHUNKS_DIR, transcript_id)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        write_json(&path, &chunks)
    }

    fn chunks(&self, transcript_id: &str) -> Result<Vec<TranscriptChunk>, StoreError> {
        Ok(read_json(&self.document(CHUNKS_DIR, transcript_id)?)?.unwrap_or_default())
    }

    fn existing_metric_names(&self) -> Result<HashSet<String>, StoreError> {
        let names: Option<Vec<String>> = read_json(&self.base_dir.join(METRICS_FILE))?;
        Ok(names.unwrap_or_default().into_iter().collect())
    }

    fn create_insight(&self, insight: Insight) -> Result<Insight, StoreError> {
        write_json(&self.document(INSIGHTS_DIR, &insight.id)?, &insight)?;
        Ok(insight)
    }

    fn get_insight(&self, id: &str) -> Result<Option<Insight>, StoreError> {
        read_json(&self.document(INSIGHTS_DIR, id)?)
    }

    fn update_insight(
        &self,
        id: &str,
        update: InsightUpdate,
    ) -> Result<Option<Insight>, StoreError> {
        let path = self.document(INSIGHTS_DIR, id)?;
        let Some(mut insight) = read_json::<Insight>(&path)? else {
            return Ok(None);
        };
        update.apply(&mut insight);
        write_json(&path, &insight)?;
        Ok(Some(insight))
    }

    fn insights(&self) -> Result<Vec<Insight>, StoreError> {
        let mut insights = Vec::new();
        for entry in fs::read_dir(self.base_dir.join(INSIGHTS_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(insight) = read_json::<Insight>(&path)? {
                insights.push(insight);
            }
        }
        // v7 ids sort by creation time.
        insights.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(insights)
    }
}

fn validate_id(id: &str) -> Result<(), StoreError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(io::Error::new(io::ErrorKind::InvalidInput, format!("invalid record id {id:?}")).into())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let contents = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &contents)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("store path missing parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("store path missing file name"))?;
    // One temp file per write so concurrent writers of a document never share it.
    let tmp_path = parent.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        uuid::Uuid::now_v7()
    ));
    fs::write(&tmp_path, contents)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}
