use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::validation::{ValidationError, optional_text, require_non_empty};

/// Detail row for a single article. `has_image` is derived per query from
/// `image_data IS NOT NULL`; the blob itself is never loaded here.
#[derive(Debug, Clone, Queryable)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub image_type: Option<String>,
    pub has_image: bool,
}

/// Listing row; identical to [`Article`] minus the stored MIME type.
#[derive(Debug, Clone, Queryable)]
pub struct ArticleSummary {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub has_image: bool,
}

/// Binary image payload with its stored MIME type, which may be absent even
/// when the blob is present.
#[derive(Debug, Clone)]
pub struct ArticleImage {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

/// An uploaded replacement image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Explicit image intent for updates: preserve the stored blob, replace it,
/// or clear it. Inferring intent from a nullable blob would leave no way to
/// remove an image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImagePatch {
    #[default]
    Keep,
    Replace(ImageUpload),
    Clear,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::articles)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub author: String,
    pub image_data: Option<Vec<u8>>,
    pub image_type: Option<String>,
}

impl NewArticle {
    pub fn new(
        title: String,
        description: String,
        author: String,
        image_url: Option<String>,
        image: Option<ImageUpload>,
    ) -> Result<Self, ValidationError> {
        let (image_data, image_type) = match image {
            Some(upload) => (Some(upload.data), Some(upload.content_type)),
            None => (None, None),
        };

        Ok(NewArticle {
            title: require_non_empty("title", &title)?,
            description: require_non_empty("description", &description)?,
            author: require_non_empty("author", &author)?,
            image_url: optional_text(image_url),
            image_data,
            image_type,
        })
    }
}

/// Full replacement of the text fields plus an image intent.
#[derive(Debug, Clone)]
pub struct ArticleChange {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub author: String,
    pub image: ImagePatch,
}

impl ArticleChange {
    pub fn new(
        title: String,
        description: String,
        author: String,
        image_url: Option<String>,
        image: ImagePatch,
    ) -> Result<Self, ValidationError> {
        Ok(ArticleChange {
            title: require_non_empty("title", &title)?,
            description: require_non_empty("description", &description)?,
            author: require_non_empty("author", &author)?,
            image_url: optional_text(image_url),
            image,
        })
    }
}
