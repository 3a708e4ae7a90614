use crate::index::{intersect, InvertedIndex};
use crate::store::RecordStore;
use crate::tokenizer::{normalize, tokenize};
use crate::{DocId, FieldType, Record};

/// Resolve a query to matching doc ids, ascending.
///
/// No query (or an empty one) lists the whole store and ignores `field`.
/// Otherwise every query term must be in the index (AND). With a field
/// restriction the candidates are re-checked against that field: a record
/// stays if any term is a substring of any of its normalized values there.
pub fn search(query: Option<&str>, field: FieldType, index: &InvertedIndex, store: &RecordStore) -> Vec<DocId> {
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => return store.doc_ids().collect(),
    };

    let terms = tokenize(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let candidates = candidates(&terms, index);
    if candidates.is_empty() || field == FieldType::All {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|&doc_id| {
            store
                .record(doc_id)
                .is_some_and(|record| field_matches(record, field, &terms))
        })
        .collect()
}

fn candidates(terms: &[String], index: &InvertedIndex) -> Vec<DocId> {
    let mut lists: Vec<&[DocId]> = terms.iter().map(|t| index.postings(t)).collect();
    // a term missing from the index empties the whole intersection
    if lists.iter().any(|l| l.is_empty()) {
        return Vec::new();
    }
    lists.sort_by_key(|l| l.len());
    let mut acc = lists[0].to_vec();
    for list in &lists[1..] {
        acc = intersect(&acc, list);
        if acc.is_empty() {
            break;
        }
    }
    acc
}

fn field_matches(record: &Record, field: FieldType, terms: &[String]) -> bool {
    let any_hit = |value: &str| {
        let value = normalize(value);
        terms.iter().any(|t| value.contains(t.as_str()))
    };
    match field {
        FieldType::All => true,
        FieldType::Title => any_hit(&record.title),
        FieldType::Author => record.author_names().any(any_hit),
        FieldType::Narrator => record.narrator_names().any(any_hit),
        FieldType::Genre => record.genres.iter().map(String::as_str).any(any_hit),
    }
}
