//! Breadth-first ordering of documents by parentage.

use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::contract::{Document, DocumentSummary};

/// Anything that sits in a document tree.
pub trait Parented {
    fn id(&self) -> &str;
    fn parent_id(&self) -> Option<&str>;
}

impl Parented for DocumentSummary {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_document_id.as_deref().filter(|p| !p.is_empty())
    }
}

impl Parented for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_document_id.as_deref().filter(|p| !p.is_empty())
    }
}

/// Orders `documents` so that every document comes after its ancestors.
///
/// Roots (no parent, or a parent missing from the input) come first in
/// input order, then each level's children in input order. Documents
/// caught in a parent cycle are appended last, in input order.
pub fn breadth_first<T: Parented>(documents: Vec<T>) -> Vec<T> {
    let order = {
        let index_of: HashMap<&str, usize> = documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id(), i))
            .collect();

        let mut roots = Vec::new();
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, doc) in documents.iter().enumerate() {
            let parent = doc
                .parent_id()
                .and_then(|p| index_of.get(p).copied())
                .filter(|&p| p != i);
            match parent {
                Some(p) => children.entry(p).or_default().push(i),
                None => {
                    if let Some(missing) = doc.parent_id() {
                        warn!(
                            document_id = %doc.id(),
                            parent_document_id = %missing,
                            "Parent not in listing, treating document as a root"
                        );
                    }
                    roots.push(i);
                }
            }
        }

        let mut visited = vec![false; documents.len()];
        let mut order = Vec::with_capacity(documents.len());
        let mut queue: VecDeque<usize> = roots.into_iter().collect();
        while let Some(i) = queue.pop_front() {
            if std::mem::replace(&mut visited[i], true) {
                continue;
            }
            order.push(i);
            if let Some(kids) = children.get(&i) {
                queue.extend(kids.iter().copied());
            }
        }

        for (i, seen) in visited.iter().enumerate() {
            if !seen {
                warn!(document_id = %documents[i].id(), "Document is part of a parent cycle");
                order.push(i);
            }
        }
        order
    };

    let mut slots: Vec<Option<T>> = documents.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}
