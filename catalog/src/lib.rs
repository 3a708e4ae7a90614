//! In-memory audiobook catalog: record store, inverted index over titles,
//! people and genres, and a paginated AND-query engine.

pub mod index;
pub mod paginate;
pub mod record;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use index::InvertedIndex;
pub use paginate::{paginate, PageInfo, MAX_PER_PAGE};
pub use record::{DocId, FieldType, NameRef, Record, RecordId};
pub use store::RecordStore;

use std::path::Path;

/// The loaded store and its index. Built once, read-only afterwards.
#[derive(Debug, Default)]
pub struct Catalog {
    pub store: RecordStore,
    pub index: InvertedIndex,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_store(store: RecordStore) -> Self {
        let index = InvertedIndex::build(&store);
        Self { store, index }
    }

    pub fn from_records<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (RecordId, Record)>,
    {
        Self::from_store(RecordStore::from_records(entries))
    }

    /// Load the dataset at `path`. Never fails: a missing or unreadable
    /// dataset yields an empty catalog.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match RecordStore::load(path) {
            Ok(store) => {
                let catalog = Self::from_store(store);
                tracing::info!(
                    path = %path.display(),
                    num_records = catalog.store.len(),
                    num_terms = catalog.index.num_terms(),
                    "catalog loaded"
                );
                catalog
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = ?err, "failed to load dataset; serving an empty catalog");
                Self::empty()
            }
        }
    }

    pub fn search(&self, query: Option<&str>, field: FieldType) -> Vec<DocId> {
        search::search(query, field, &self.index, &self.store)
    }
}
