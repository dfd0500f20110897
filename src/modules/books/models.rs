use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A catalog entry.
///
/// `tags` is never absent once decoded: a `null` or missing column reads as an
/// empty list, so every consumer sees the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// RFC 3339 timestamp set by the store on insert
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The writable part of a [`Book`]. `id` and `created_at` belong to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Accepts a list or a comma-separated string.
    #[serde(default, deserialize_with = "list_or_joined")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// A request body member with the wrong shape.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid `{field}`: {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl BookFields {
    /// Read a JSON request object member by member. Missing or `null`
    /// members read as empty; unknown members are ignored.
    pub fn from_json_object(mut object: Map<String, Value>) -> Result<Self, FieldError> {
        Ok(Self {
            title: member(&mut object, "title")?.unwrap_or_default(),
            author: member(&mut object, "author")?.unwrap_or_default(),
            tags: member::<TagList>(&mut object, "tags")?
                .map(TagList::into_tags)
                .unwrap_or_default(),
            cover_url: member(&mut object, "cover_url")?,
        })
    }

    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    /// Both title and author must have visible characters.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.author.trim().is_empty()
    }
}

/// Split a comma-separated tag string: trim each piece, drop the empty ones,
/// keep the order.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn member<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, FieldError> {
    match object.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| FieldError {
                field,
                reason: err.to_string(),
            }),
    }
}

#[derive(Deserialize)]
#[serde(untagged, expecting = "a list of strings or a comma-separated string")]
enum TagList {
    List(Vec<String>),
    Joined(String),
}

impl TagList {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagList::List(tags) => tags,
            TagList::Joined(raw) => split_tags(&raw),
        }
    }
}

fn list_or_joined<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TagList>::deserialize(deserializer)?
        .map(TagList::into_tags)
        .unwrap_or_default())
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// Stores differ on key type (uuid vs bigint).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
