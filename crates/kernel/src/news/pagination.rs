//! Pagination compiler.

use bson::{Document, doc};

use super::pipeline::StageDocument;
use super::types::Pagination;

impl StageDocument for Pagination {
    fn stage_documents(&self) -> Vec<Document> {
        let mut stages = Vec::with_capacity(2);
        if self.offset > 0 {
            stages.push(doc! { "$skip": self.offset });
        }
        if self.limit > 0 {
            stages.push(doc! { "$limit": self.limit });
        }
        stages
    }
}
