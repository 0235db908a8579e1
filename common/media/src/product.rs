//! Image fields of catalog product records.
//!
//! The catalog API has shipped products under several naming conventions over
//! time. Each convention gets its own field here; resolution order lives in
//! [`ProductImageFields::primary_candidates`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductImageFields {
    #[serde(rename = "imageUrl", default, deserialize_with = "lenient")]
    pub image_url: Option<String>,
    #[serde(rename = "ImageUrl", default, deserialize_with = "lenient")]
    pub image_url_pascal: Option<String>,
    #[serde(rename = "imageUrls", default, deserialize_with = "lenient_list")]
    pub image_urls: Vec<String>,
    #[serde(rename = "ImageUrls", default, deserialize_with = "lenient_list")]
    pub image_urls_pascal: Vec<String>,
    #[serde(rename = "images", default, deserialize_with = "lenient_list")]
    pub images: Vec<ImageEntry>,
    #[serde(rename = "Images", default, deserialize_with = "lenient_list")]
    pub images_pascal: Vec<ImageEntry>,
}

/// One element of an `images` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImageEntry {
    Path(String),
    Object(ImageObject),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageObject {
    #[serde(rename = "url", default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(rename = "Url", default, deserialize_with = "lenient")]
    pub url_pascal: Option<String>,
}

impl ImageEntry {
    pub fn reference(&self) -> Option<&str> {
        match self {
            ImageEntry::Path(path) => Some(path.as_str()),
            ImageEntry::Object(object) => object
                .url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .or(object.url_pascal.as_deref()),
        }
    }
}

impl ProductImageFields {
    /// Read the image fields of any JSON value. Anything that is not an
    /// object yields a product without images.
    pub fn from_value(value: &Value) -> Self {
        match Self::deserialize(value) {
            Ok(fields) => fields,
            Err(err) => {
                debug!(error = %err, "product record has no readable image fields");
                Self::default()
            }
        }
    }

    /// Candidates for the main image, highest priority first: singular
    /// fields, then the first string of each list, then the first object.
    pub fn primary_candidates(&self) -> Vec<&str> {
        [
            self.image_url.as_deref(),
            self.image_url_pascal.as_deref(),
            self.image_urls.first().map(String::as_str),
            self.image_urls_pascal.first().map(String::as_str),
            self.images.first().and_then(ImageEntry::reference),
            self.images_pascal.first().and_then(ImageEntry::reference),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Every reference across all fields, in the same field order.
    pub fn references(&self) -> Vec<&str> {
        let singular = [self.image_url.as_deref(), self.image_url_pascal.as_deref()]
            .into_iter()
            .flatten();
        let lists = self
            .image_urls
            .iter()
            .chain(&self.image_urls_pascal)
            .map(String::as_str);
        let objects = self
            .images
            .iter()
            .chain(&self.images_pascal)
            .filter_map(ImageEntry::reference);
        singular.chain(lists).chain(objects).collect()
    }
}

// A field of the wrong JSON type reads as absent instead of failing the record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// Same for lists, element by element.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
