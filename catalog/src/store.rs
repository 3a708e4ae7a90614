use crate::{DocId, Record, RecordId};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Immutable record collection. Records are held in ascending key order,
/// and a record's position is its `DocId`.
#[derive(Debug, Default)]
pub struct RecordStore {
    ids: Vec<RecordId>,
    records: Vec<Record>,
    by_id: HashMap<RecordId, DocId>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(id, record)` pairs. A repeated id keeps its last record.
    pub fn from_records<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (RecordId, Record)>,
    {
        let mut keyed: Vec<(RecordId, Record)> = entries.into_iter().collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        // stable sort: the last duplicate sits last in its run
        keyed.reverse();
        keyed.dedup_by(|a, b| a.0 == b.0);
        keyed.reverse();

        let mut store = Self::new();
        for (doc_id, (id, record)) in keyed.into_iter().enumerate() {
            store.by_id.insert(id.clone(), doc_id as DocId);
            store.ids.push(id);
            store.records.push(record);
        }
        store
    }

    /// Read a JSON object keyed by record id. Entries that do not decode as
    /// a record are skipped with a warning.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("opening dataset {}", path.display()))?;
        let raw: Map<String, Value> = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parsing dataset {}", path.display()))?;
        Ok(Self::from_json_map(raw))
    }

    pub fn from_json_map(raw: Map<String, Value>) -> Self {
        let total = raw.len();
        let mut entries = Vec::with_capacity(total);
        for (id, value) in raw {
            match serde_json::from_value::<Record>(value) {
                Ok(record) => entries.push((id, record)),
                Err(err) => tracing::warn!(%id, error = %err, "skipping malformed record"),
            }
        }
        let skipped = total - entries.len();
        if skipped > 0 {
            tracing::warn!(skipped, total, "some records could not be decoded");
        }
        Self::from_records(entries)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn doc_id(&self, id: &str) -> Option<DocId> {
        self.by_id.get(id).copied()
    }

    pub fn record_id(&self, doc_id: DocId) -> Option<&str> {
        self.ids.get(doc_id as usize).map(String::as_str)
    }

    pub fn record(&self, doc_id: DocId) -> Option<&Record> {
        self.records.get(doc_id as usize)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Record> {
        self.doc_id(id).and_then(|d| self.record(d))
    }

    /// Linear scan; the first record in key order with this `idDownload` wins.
    pub fn get_by_download_id(&self, id: &str) -> Option<(&str, &Record)> {
        self.iter().find(|(_, r)| r.id_download == id)
    }

    /// Primary id first, then `idDownload`.
    pub fn lookup(&self, id: &str) -> Option<(&str, &Record)> {
        match self.doc_id(id) {
            Some(d) => self.record_id(d).zip(self.record(d)),
            None => self.get_by_download_id(id),
        }
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        (0..self.records.len()).map(|d| d as DocId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.ids.iter().map(String::as_str).zip(self.records.iter())
    }
}
