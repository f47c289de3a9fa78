//! Lookup graph builder.
//!
//! Each entity kind has an ordered summary graph (cheap, directly referenced
//! joins) and a set of extra joins that only the full graph carries. A join
//! either leaves its result as an array, collapses a single match into an
//! embedded object (`unwind`), or, for self-referential fields, runs a
//! sub-pipeline that expands the joined documents with their own summary
//! graph. Self-referential expansion is bounded by an explicit remaining
//! depth.

use bson::{Bson, Document, doc};

use super::types::{Collection, EntityKind, Expansion};

/// Default number of self-referential expansion levels.
pub const DEFAULT_RELATED_DEPTH: u8 = 1;

/// One declared join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    /// Reference field on the base document; also the output field.
    pub field: &'static str,
    /// Collection the references point into.
    pub collection: Collection,
    /// Collapse the one-element result into an embedded object.
    pub unwind: bool,
    /// For self-referential joins, the kind whose summary graph expands
    /// the joined documents.
    pub expand: Option<EntityKind>,
}

impl Join {
    /// Single-valued reference, collapsed into an embedded object.
    const fn one(field: &'static str, collection: Collection) -> Self {
        Self {
            field,
            collection,
            unwind: true,
            expand: None,
        }
    }

    /// Multi-valued reference, left as an array.
    const fn many(field: &'static str, collection: Collection) -> Self {
        Self {
            field,
            collection,
            unwind: false,
            expand: None,
        }
    }

    /// Array of references into a collection whose documents get expanded.
    const fn nested(field: &'static str, collection: Collection, kind: EntityKind) -> Self {
        Self {
            field,
            collection,
            unwind: false,
            expand: Some(kind),
        }
    }

    pub fn is_self_referential(&self) -> bool {
        self.expand.is_some()
    }
}

/// Predefined joins of one entity kind.
#[derive(Debug)]
pub struct JoinGraph {
    /// Joins shared by summary and full expansion.
    pub summary: &'static [Join],
    /// Joins only the full expansion carries.
    pub extended: &'static [Join],
}

static POST_GRAPH: JoinGraph = JoinGraph {
    summary: &[
        Join::one("heroImage", Collection::Images),
        Join::one("leading_image_portrait", Collection::Images),
        Join::one("og_image", Collection::Images),
        Join::many("categories", Collection::Categories),
        Join::one("topics", Collection::Topics),
    ],
    extended: &[
        Join::one("leading_video", Collection::Videos),
        Join::many("tags", Collection::Tags),
        Join::one("theme", Collection::Themes),
        Join::many("writters", Collection::Contacts),
        Join::many("photographers", Collection::Contacts),
        Join::many("designers", Collection::Contacts),
        Join::many("engineers", Collection::Contacts),
        Join::nested("relateds", Collection::Posts, EntityKind::Post),
    ],
};

static TOPIC_GRAPH: JoinGraph = JoinGraph {
    summary: &[
        Join::one("leading_image", Collection::Images),
        Join::one("leading_image_portrait", Collection::Images),
        Join::one("og_image", Collection::Images),
    ],
    extended: &[
        Join::one("leading_video", Collection::Videos),
        Join::nested("relateds", Collection::Posts, EntityKind::Post),
    ],
};

static AUTHOR_GRAPH: JoinGraph = JoinGraph {
    summary: &[Join::one("thumbnail", Collection::Images)],
    extended: &[],
};

impl JoinGraph {
    pub fn of(kind: EntityKind) -> &'static JoinGraph {
        match kind {
            EntityKind::Post => &POST_GRAPH,
            EntityKind::Topic => &TOPIC_GRAPH,
            EntityKind::Author => &AUTHOR_GRAPH,
        }
    }

    /// Joins of the given expansion, in stage order.
    pub fn joins(&self, expansion: Expansion) -> impl Iterator<Item = &'static Join> + use<> {
        let extended: &'static [Join] = match expansion {
            Expansion::Summary => &[],
            Expansion::Full => self.extended,
        };
        self.summary.iter().chain(extended.iter())
    }
}

/// Builds the lookup stages for one entity kind and expansion.
#[derive(Debug, Clone, Copy)]
pub struct LookupBuilder {
    kind: EntityKind,
    expansion: Expansion,
    depth: u8,
}

impl LookupBuilder {
    pub fn new(kind: EntityKind, expansion: Expansion) -> Self {
        Self {
            kind,
            expansion,
            depth: DEFAULT_RELATED_DEPTH,
        }
    }

    /// Set how many levels of self-referential joins are expanded.
    ///
    /// At depth 0 self-referential fields keep their raw ids.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    pub fn build(&self) -> Vec<Document> {
        let mut stages = Vec::new();
        push_joins(
            JoinGraph::of(self.kind).joins(self.expansion),
            self.depth,
            &mut stages,
        );
        stages
    }
}

fn push_joins<'a>(joins: impl Iterator<Item = &'a Join>, depth: u8, stages: &mut Vec<Document>) {
    for join in joins {
        match join.expand {
            Some(kind) => {
                if depth == 0 {
                    tracing::debug!(
                        field = join.field,
                        "related depth exhausted, leaving references unexpanded"
                    );
                    continue;
                }
                stages.push(nested_lookup(join, kind, depth - 1));
            }
            None => {
                stages.push(lookup(join));
                if join.unwind {
                    stages.push(unwind(join.field));
                }
            }
        }
    }
}

/// `$lookup` joining the reference field to the foreign `_id`.
fn lookup(join: &Join) -> Document {
    doc! {
        "$lookup": {
            "from": join.collection.as_str(),
            "localField": join.field,
            "foreignField": "_id",
            "as": join.field,
        }
    }
}

/// `$unwind` that keeps parents whose reference has no match.
fn unwind(field: &str) -> Document {
    doc! {
        "$unwind": {
            "path": format!("${field}"),
            "preserveNullAndEmptyArrays": true,
        }
    }
}

/// `$lookup` with a sub-pipeline that selects the referenced documents and
/// expands them with the summary graph of `kind`. Self-referential joins of
/// `kind` are only included while `remaining` allows another level.
fn nested_lookup(join: &Join, kind: EntityKind, remaining: u8) -> Document {
    let mut pipeline = vec![doc! {
        "$match": {
            "$expr": { "$in": ["$_id", "$$ids"] }
        }
    }];

    let graph = JoinGraph::of(kind);
    let deeper = graph
        .extended
        .iter()
        .filter(|j| j.is_self_referential() && remaining > 0);
    push_joins(graph.summary.iter().chain(deeper), remaining, &mut pipeline);

    let empty: Vec<Bson> = Vec::new();
    doc! {
        "$lookup": {
            "from": join.collection.as_str(),
            "let": { "ids": { "$ifNull": [format!("${}", join.field), empty] } },
            "pipeline": pipeline,
            "as": join.field,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    /// Output fields of every `$lookup` stage, in order.
    fn lookup_fields(stages: &[Document]) -> Vec<String> {
        stages
            .iter()
            .filter_map(|s| s.get_document("$lookup").ok())
            .map(|l| l.get_str("as").unwrap().to_string())
            .collect()
    }

    fn find_lookup<'a>(stages: &'a [Document], field: &str) -> &'a Document {
        stages
            .iter()
            .filter_map(|s| s.get_document("$lookup").ok())
            .find(|l| l.get_str("as").is_ok_and(|a| a == field))
            .unwrap()
    }

    fn sub_pipeline(lookup: &Document) -> Vec<Document> {
        lookup
            .get_array("pipeline")
            .unwrap()
            .iter()
            .map(|b| b.as_document().unwrap().clone())
            .collect()
    }

    const CREDIT_FIELDS: [&str; 4] = ["writters", "photographers", "designers", "engineers"];

    #[test]
    fn summary_post_skips_credits() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Summary).build();
        let fields = lookup_fields(&stages);
        for credit in CREDIT_FIELDS {
            assert!(!fields.contains(&credit.to_string()), "{credit} in summary");
        }
        assert!(!fields.contains(&"relateds".to_string()));
    }

    #[test]
    fn full_post_includes_credits() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Full).build();
        let fields = lookup_fields(&stages);
        for credit in CREDIT_FIELDS {
            assert!(fields.contains(&credit.to_string()), "{credit} missing");
        }
    }

    #[test]
    fn full_graph_starts_with_summary_joins() {
        let summary = LookupBuilder::new(EntityKind::Post, Expansion::Summary).build();
        let full = LookupBuilder::new(EntityKind::Post, Expansion::Full).build();
        assert_eq!(&full[..summary.len()], summary.as_slice());
    }

    #[test]
    fn unwind_follows_scalar_lookup() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Summary).build();
        assert_eq!(
            stages[0],
            doc! {
                "$lookup": {
                    "from": "images",
                    "localField": "heroImage",
                    "foreignField": "_id",
                    "as": "heroImage",
                }
            }
        );
        assert_eq!(
            stages[1],
            doc! {
                "$unwind": {
                    "path": "$heroImage",
                    "preserveNullAndEmptyArrays": true,
                }
            }
        );
    }

    #[test]
    fn multi_valued_lookup_is_not_unwound() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Summary).build();
        let idx = stages
            .iter()
            .position(|s| {
                s.get_document("$lookup")
                    .is_ok_and(|l| l.get_str("as").is_ok_and(|a| a == "categories"))
            })
            .unwrap();
        assert_eq!(
            find_lookup(&stages, "categories").get_str("from").unwrap(),
            "postcategories"
        );
        assert!(stages[idx + 1].contains_key("$lookup"));
    }

    #[test]
    fn relateds_recurse_exactly_one_level() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Full).build();
        let relateds = find_lookup(&stages, "relateds");

        assert_eq!(relateds.get_str("from").unwrap(), "posts");
        assert!(!relateds.contains_key("localField"));
        assert_eq!(
            relateds.get_document("let").unwrap(),
            &doc! { "ids": { "$ifNull": ["$relateds", Vec::<Bson>::new()] } }
        );

        let pipeline = sub_pipeline(relateds);
        assert_eq!(
            pipeline[0],
            doc! { "$match": { "$expr": { "$in": ["$_id", "$$ids"] } } }
        );

        let nested = &pipeline[1..];
        let summary = LookupBuilder::new(EntityKind::Post, Expansion::Summary).build();
        assert_eq!(nested, summary.as_slice());
        assert!(!lookup_fields(nested).contains(&"relateds".to_string()));
    }

    #[test]
    fn topic_relateds_expand_posts() {
        let stages = LookupBuilder::new(EntityKind::Topic, Expansion::Full).build();
        let relateds = find_lookup(&stages, "relateds");
        let nested = sub_pipeline(relateds);
        let fields = lookup_fields(&nested[1..]);
        assert!(fields.contains(&"heroImage".to_string()));
        assert!(!fields.contains(&"writters".to_string()));
    }

    #[test]
    fn zero_depth_skips_self_referential_joins() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Full)
            .with_depth(0)
            .build();
        let fields = lookup_fields(&stages);
        assert!(!fields.contains(&"relateds".to_string()));
        assert!(fields.contains(&"writters".to_string()));
    }

    #[test]
    fn deeper_depth_nests_another_level() {
        let stages = LookupBuilder::new(EntityKind::Post, Expansion::Full)
            .with_depth(2)
            .build();
        let outer = sub_pipeline(find_lookup(&stages, "relateds"));
        let inner = sub_pipeline(find_lookup(&outer, "relateds"));
        assert!(!lookup_fields(&inner).contains(&"relateds".to_string()));
        assert!(!lookup_fields(&outer).contains(&"writters".to_string()));
    }

    #[test]
    fn author_graphs_match() {
        let summary = LookupBuilder::new(EntityKind::Author, Expansion::Summary).build();
        let full = LookupBuilder::new(EntityKind::Author, Expansion::Full).build();
        assert_eq!(summary, full);
        assert_eq!(lookup_fields(&summary), vec!["thumbnail".to_string()]);
    }

    #[test]
    fn summary_graphs_have_no_self_references() {
        for kind in [EntityKind::Post, EntityKind::Topic, EntityKind::Author] {
            assert!(
                JoinGraph::of(kind)
                    .summary
                    .iter()
                    .all(|j| !j.is_self_referential()),
                "{kind:?} summary graph must not recurse"
            );
        }
    }
}
