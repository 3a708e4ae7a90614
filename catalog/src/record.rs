use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type RecordId = String;
pub type DocId = u32;

/// An author or narrator entry. The dataset mixes bare names and objects
/// like `{"id": "...", "name": "...", "deepLink": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameRef {
    Plain(String),
    Named {
        name: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Anything else; kept for the response but never indexed.
    Other(Value),
}

impl NameRef {
    pub fn resolve(&self) -> Option<&str> {
        match self {
            NameRef::Plain(name) => Some(name),
            NameRef::Named { name, .. } => Some(name),
            NameRef::Other(_) => None,
        }
    }
}

impl From<&str> for NameRef {
    fn from(name: &str) -> Self {
        NameRef::Plain(name.to_string())
    }
}

impl From<String> for NameRef {
    fn from(name: String) -> Self {
        NameRef::Plain(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    #[serde(default, deserialize_with = "or_default")]
    pub authors: Vec<NameRef>,
    #[serde(default, deserialize_with = "or_default")]
    pub narrators: Vec<NameRef>,
    #[serde(default, deserialize_with = "strings_only")]
    pub genres: Vec<String>,
    #[serde(rename = "idDownload", default, deserialize_with = "or_default")]
    pub id_download: String,
    /// description, language, formats, cover, ... passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            narrators: Vec::new(),
            genres: Vec::new(),
            id_download: String::new(),
            extra: Map::new(),
        }
    }

    pub fn with_authors<I, N>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NameRef>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_narrators<I, N>(mut self, narrators: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NameRef>,
    {
        self.narrators = narrators.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_download_id(mut self, id: impl Into<String>) -> Self {
        self.id_download = id.into();
        self
    }

    pub fn author_names(&self) -> impl Iterator<Item = &str> {
        self.authors.iter().filter_map(NameRef::resolve)
    }

    pub fn narrator_names(&self) -> impl Iterator<Item = &str> {
        self.narrators.iter().filter_map(NameRef::resolve)
    }

    /// Every searchable value: title, author names, narrator names, genres.
    pub fn searchable_values(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.author_names())
            .chain(self.narrator_names())
            .chain(self.genres.iter().map(String::as_str))
    }
}

/// `null` or a value of the wrong shape becomes the empty default, so one
/// bad field does not cost the whole record.
fn or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(de)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Like `or_default`, but keeps the string entries of a mixed list.
fn strings_only<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Field restriction for a search request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    All,
    Title,
    Author,
    Narrator,
    Genre,
}
