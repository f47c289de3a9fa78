//! Filter compiler.
//!
//! Maps a [`Filter`] onto at most one `$match` stage. Fields are visited
//! through an explicit, ordered descriptor table so the emitted condition
//! order never depends on request order.

use bson::oid::ObjectId;
use bson::{Bson, Document, doc};

use super::pipeline::StageDocument;
use super::types::Filter;

/// Typed value extracted from one filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue<'a> {
    /// Equality on a string; ignored when empty.
    Text(&'a str),
    /// Equality on a boolean; ignored when unset.
    Flag(Option<bool>),
    /// Membership in a list of hex object ids; ignored when empty.
    ObjectIds(&'a [String]),
}

impl FilterValue<'_> {
    /// True when the value should not contribute a condition.
    pub fn is_zero(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Flag(flag) => flag.is_none(),
            FilterValue::ObjectIds(ids) => ids.is_empty(),
        }
    }

    /// Build the condition value placed under the field's document key.
    pub fn condition(&self) -> Option<Bson> {
        if self.is_zero() {
            return None;
        }
        match self {
            FilterValue::Text(s) => Some(Bson::String((*s).to_string())),
            FilterValue::Flag(flag) => flag.map(Bson::Boolean),
            FilterValue::ObjectIds(raw) => {
                Some(Bson::Document(doc! { "$in": parse_object_ids(raw) }))
            }
        }
    }
}

/// Declared mapping from a filter field to its document key.
pub struct FilterField {
    /// Document key the condition is placed under.
    pub key: &'static str,
    /// Extracts the field's typed value.
    pub value: fn(&Filter) -> FilterValue<'_>,
}

/// Filter fields in declaration order.
pub const FILTER_FIELDS: [FilterField; 7] = [
    FilterField {
        key: "slug",
        value: |f| FilterValue::Text(&f.slug),
    },
    FilterField {
        key: "state",
        value: |f| FilterValue::Text(&f.state),
    },
    FilterField {
        key: "style",
        value: |f| FilterValue::Text(&f.style),
    },
    FilterField {
        key: "isFeatured",
        value: |f| FilterValue::Flag(f.is_featured),
    },
    FilterField {
        key: "categories",
        value: |f| FilterValue::ObjectIds(&f.categories),
    },
    FilterField {
        key: "tags",
        value: |f| FilterValue::ObjectIds(&f.tags),
    },
    FilterField {
        key: "_id",
        value: |f| FilterValue::ObjectIds(&f.ids),
    },
];

impl Filter {
    /// Conditions of the `$match` stage, in declaration order.
    pub fn conditions(&self) -> Document {
        let mut conditions = Document::new();
        for field in &FILTER_FIELDS {
            if let Some(condition) = (field.value)(self).condition() {
                conditions.insert(field.key, condition);
            }
        }
        conditions
    }

    /// True when every field is at its zero value.
    pub fn is_empty(&self) -> bool {
        FILTER_FIELDS.iter().all(|field| (field.value)(self).is_zero())
    }
}

impl StageDocument for Filter {
    fn stage_documents(&self) -> Vec<Document> {
        let conditions = self.conditions();
        if conditions.is_empty() {
            return Vec::new();
        }
        vec![doc! { "$match": conditions }]
    }
}

/// Convert hex strings to object ids, dropping (and logging) malformed entries.
pub fn parse_object_ids(raw: &[String]) -> Vec<ObjectId> {
    raw.iter()
        .filter_map(|value| match ObjectId::parse_str(value) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(value = %value, error = %e, "dropping malformed object id");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const VALID_ID: &str = "5a1f6c8d9e0b1c2d3e4f5a6b";

    #[test]
    fn zero_filter_emits_nothing() {
        let filter = Filter::default();
        assert!(filter.is_empty());
        assert!(filter.stage_documents().is_empty());
    }

    #[test]
    fn single_field_emits_single_condition() {
        let cases = [
            (
                Filter {
                    slug: "s".to_string(),
                    ..Default::default()
                },
                "slug",
            ),
            (
                Filter {
                    state: "published".to_string(),
                    ..Default::default()
                },
                "state",
            ),
            (
                Filter {
                    style: "review".to_string(),
                    ..Default::default()
                },
                "style",
            ),
            (
                Filter {
                    is_featured: Some(false),
                    ..Default::default()
                },
                "isFeatured",
            ),
            (
                Filter {
                    categories: vec![VALID_ID.to_string()],
                    ..Default::default()
                },
                "categories",
            ),
            (
                Filter {
                    tags: vec![VALID_ID.to_string()],
                    ..Default::default()
                },
                "tags",
            ),
            (
                Filter {
                    ids: vec![VALID_ID.to_string()],
                    ..Default::default()
                },
                "_id",
            ),
        ];

        for (filter, key) in cases {
            let stages = filter.stage_documents();
            assert_eq!(stages.len(), 1, "one match stage for {key}");
            let conditions = stages[0].get_document("$match").unwrap();
            assert_eq!(conditions.len(), 1, "one condition for {key}");
            assert!(conditions.contains_key(key), "condition keyed by {key}");
        }
    }

    #[test]
    fn explicit_false_flag_is_a_condition() {
        let filter = Filter {
            is_featured: Some(false),
            ..Default::default()
        };
        assert_eq!(filter.conditions(), doc! { "isFeatured": false });
    }

    #[test]
    fn malformed_ids_are_dropped() {
        let filter = Filter {
            ids: vec![VALID_ID.to_string(), "not-a-hex-id".to_string()],
            ..Default::default()
        };
        let expected = ObjectId::parse_str(VALID_ID).unwrap();
        assert_eq!(
            filter.stage_documents(),
            vec![doc! { "$match": { "_id": { "$in": [expected] } } }]
        );
    }

    #[test]
    fn all_malformed_ids_match_nothing() {
        let filter = Filter {
            tags: vec!["zz".to_string()],
            ..Default::default()
        };
        let empty: Vec<ObjectId> = Vec::new();
        assert_eq!(filter.conditions(), doc! { "tags": { "$in": empty } });
    }

    #[test]
    fn conditions_follow_declaration_order() {
        let filter = Filter {
            ids: vec![VALID_ID.to_string()],
            is_featured: Some(true),
            slug: "s".to_string(),
            ..Default::default()
        };
        let conditions = filter.conditions();
        let keys: Vec<&str> = conditions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["slug", "isFeatured", "_id"]);
    }

    #[test]
    fn parse_object_ids_keeps_order() {
        let other = "5a1f6c8d9e0b1c2d3e4f5a6c";
        let ids = parse_object_ids(&[other.to_string(), "x".to_string(), VALID_ID.to_string()]);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].to_hex(), other);
        assert_eq!(ids[1].to_hex(), VALID_ID);
    }
}
