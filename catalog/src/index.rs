use crate::store::RecordStore;
use crate::tokenizer::tokenize;
use crate::DocId;
use std::collections::HashMap;

/// Term -> posting list. Posting lists are sorted by doc id and free of
/// duplicates.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    pub postings: HashMap<String, Vec<DocId>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index title, author names, narrator names and genres of every record.
    pub fn build(store: &RecordStore) -> Self {
        let mut index = Self::new();
        for doc_id in store.doc_ids() {
            let Some(record) = store.record(doc_id) else { continue };
            for value in record.searchable_values() {
                for term in tokenize(value) {
                    let plist = index.postings.entry(term).or_default();
                    // doc ids arrive in ascending order, so only the tail can repeat
                    if plist.last() != Some(&doc_id) {
                        plist.push(doc_id);
                    }
                }
            }
        }
        tracing::debug!(num_docs = store.len(), num_terms = index.num_terms(), "built inverted index");
        index
    }

    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }
}

/// Merge-intersect two sorted posting lists.
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
