//! Entities decoded from aggregation results.
//!
//! Reference fields are [`Related`] values so the same type decodes both
//! summary results (where only some references were joined) and full
//! results. Ids serialize to JSON as hex strings.

use bson::oid::ObjectId;
use bson::serde_helpers::serialize_object_id_as_hex_string;
use bson::{Bson, DateTime as BsonDateTime};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::types::EntityKind;

/// A top-level entity served by the store.
pub trait Entity: DeserializeOwned + Send + 'static {
    const KIND: EntityKind;
}

/// A reference that is either still a raw id or has been joined.
#[derive(Debug, Clone, PartialEq)]
pub enum Related<T> {
    Id(ObjectId),
    Expanded(T),
}

impl<T> Related<T> {
    pub fn expanded(&self) -> Option<&T> {
        match self {
            Related::Expanded(value) => Some(value),
            Related::Id(_) => None,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Related::Expanded(_))
    }
}

impl<T: Serialize> Serialize for Related<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Related::Id(id) => serializer.serialize_str(&id.to_hex()),
            Related::Expanded(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Related<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Bson::deserialize(deserializer)? {
            Bson::ObjectId(id) => Ok(Related::Id(id)),
            Bson::String(hex) => ObjectId::parse_str(&hex)
                .map(Related::Id)
                .map_err(D::Error::custom),
            Bson::Document(doc) => bson::from_document(doc)
                .map(Related::Expanded)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected object id or embedded document, found {:?}",
                other.element_type()
            ))),
        }
    }
}

/// Treat an explicit `null` like a missing value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn bson_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BsonDateTime>::deserialize(deserializer)?.map(BsonDateTime::to_chrono))
}

/// Integer that may have been stored as a double.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::Int32(value)) => Ok(Some(i64::from(value))),
        Some(Bson::Int64(value)) => Ok(Some(value)),
        Some(Bson::Double(value)) if value.is_finite() => Ok(Some(value.round() as i64)),
        Some(other) => Err(D::Error::custom(format!(
            "expected a number, found {:?}",
            other.element_type()
        ))),
    }
}

/// Stored image with its resized variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub copyright: String,
    #[serde(default)]
    pub image: Option<ImageAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filetype: String,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub width: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub height: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(
        default,
        rename(deserialize = "resizedTargets", serialize = "resized_targets")
    )]
    pub resized_targets: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub video: Option<VideoAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAsset {
    #[serde(default, deserialize_with = "null_as_default")]
    pub filetype: String,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// Tag or category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

pub type Tag = Label;
pub type Category = Label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_position: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub header_position: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub font_color: String,
}

/// Author, stored in the `contacts` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_title: String,
    #[serde(default)]
    pub bio: Option<serde_json::Value>,
    #[serde(default)]
    pub thumbnail: Option<Related<Image>>,
    #[serde(
        default,
        rename(deserialize = "updatedAt", serialize = "updated_at"),
        deserialize_with = "bson_datetime"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub og_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub og_description: String,
    #[serde(default)]
    pub brief: Option<serde_json::Value>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extend_byline: String,
    #[serde(
        default,
        rename(deserialize = "isFeatured", serialize = "is_featured"),
        deserialize_with = "null_as_default"
    )]
    pub is_featured: bool,
    #[serde(
        default,
        rename(deserialize = "isExternal", serialize = "is_external"),
        deserialize_with = "null_as_default"
    )]
    pub is_external: bool,
    #[serde(
        default,
        rename(deserialize = "publishedDate", serialize = "published_date"),
        deserialize_with = "bson_datetime"
    )]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename(deserialize = "updatedAt", serialize = "updated_at"),
        deserialize_with = "bson_datetime"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename(deserialize = "heroImage", serialize = "hero_image"))]
    pub hero_image: Option<Related<Image>>,
    #[serde(default)]
    pub leading_image_portrait: Option<Related<Image>>,
    #[serde(default)]
    pub og_image: Option<Related<Image>>,
    #[serde(default)]
    pub leading_video: Option<Related<Video>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Related<Category>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Related<Tag>>,
    #[serde(default, rename(deserialize = "topics", serialize = "topic"))]
    pub topic: Option<Related<Topic>>,
    #[serde(default)]
    pub theme: Option<Related<Theme>>,
    #[serde(
        default,
        rename(deserialize = "writters", serialize = "writers"),
        deserialize_with = "null_as_default"
    )]
    pub writers: Vec<Related<Author>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photographers: Vec<Related<Author>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub designers: Vec<Related<Author>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub engineers: Vec<Related<Author>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relateds: Vec<Related<Post>>,
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(
        rename(deserialize = "_id", serialize = "id"),
        serialize_with = "serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub short_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub og_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub og_description: String,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    #[serde(default)]
    pub team_description: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_position: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relateds_format: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relateds_background: String,
    #[serde(
        default,
        rename(deserialize = "publishedDate", serialize = "published_date"),
        deserialize_with = "bson_datetime"
    )]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        rename(deserialize = "updatedAt", serialize = "updated_at"),
        deserialize_with = "bson_datetime"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub leading_image: Option<Related<Image>>,
    #[serde(default)]
    pub leading_image_portrait: Option<Related<Image>>,
    #[serde(default)]
    pub og_image: Option<Related<Image>>,
    #[serde(default)]
    pub leading_video: Option<Related<Video>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relateds: Vec<Related<Post>>,
}

impl Entity for Topic {
    const KIND: EntityKind = EntityKind::Topic;
}
