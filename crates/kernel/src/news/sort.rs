//! Sort compiler.
//!
//! All active sort flags combine into a single `$sort` stage, keyed in
//! declaration order.

use bson::{Document, doc};

use super::pipeline::StageDocument;
use super::types::{SortBy, SortOrder};

/// Declared mapping from a sort flag to its document key.
pub struct SortField {
    pub key: &'static str,
    pub order: fn(&SortBy) -> Option<SortOrder>,
}

/// Sort fields in declaration order.
pub const SORT_FIELDS: [SortField; 2] = [
    SortField {
        key: "publishedDate",
        order: |s| s.published_date,
    },
    SortField {
        key: "updatedAt",
        order: |s| s.updated_at,
    },
];

impl SortBy {
    /// Body of the `$sort` stage; empty when no flag is set.
    pub fn sort_document(&self) -> Document {
        let mut sort = Document::new();
        for field in &SORT_FIELDS {
            if let Some(order) = (field.order)(self) {
                sort.insert(field.key, order.direction());
            }
        }
        sort
    }
}

impl StageDocument for SortBy {
    fn stage_documents(&self) -> Vec<Document> {
        let sort = self.sort_document();
        if sort.is_empty() {
            return Vec::new();
        }
        vec![doc! { "$sort": sort }]
    }
}
