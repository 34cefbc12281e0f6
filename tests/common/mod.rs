use async_trait::async_trait;
use axum::Router;
use chrono::{NaiveDateTime, Utc};
use std::sync::{Arc, Mutex};

use newsdesk::AppState;
use newsdesk::errors::ApiError;
use newsdesk::models::{
    Article, ArticleChange, ArticleImage, ArticleSummary, ImagePatch, NewArticle,
};
use newsdesk::repositories::ArticleRepository;

/// In-memory stand-in for the MySQL store, mirroring its observable
/// contracts: creation-time ordering with id tie-break, collation-style
/// case-insensitive search, image tri-state on update.
#[derive(Clone, Default)]
pub struct MockArticleRepository {
    inner: Arc<Mutex<MockDb>>,
}

#[derive(Default)]
struct MockDb {
    articles: Vec<StoredArticle>,
    last_id: i32,
}

#[derive(Clone)]
struct StoredArticle {
    id: i32,
    title: String,
    description: String,
    image_url: Option<String>,
    author: String,
    image_data: Option<Vec<u8>>,
    image_type: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl StoredArticle {
    fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            author: self.author.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            has_image: self.image_data.is_some(),
        }
    }
}

fn matches_term(stored: &StoredArticle, term: &str) -> bool {
    let term = term.to_lowercase();
    stored.title.to_lowercase().contains(&term)
        || stored.description.to_lowercase().contains(&term)
        || stored.author.to_lowercase().contains(&term)
}

fn ordered_newest_first(mut rows: Vec<StoredArticle>) -> Vec<StoredArticle> {
    rows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    rows
}

#[async_trait]
impl ArticleRepository for MockArticleRepository {
    async fn list(&self, limit: i64) -> Result<Vec<ArticleSummary>, ApiError> {
        let db = self.inner.lock().unwrap();
        let rows = ordered_newest_first(db.articles.clone());

        let rows = if limit > 0 {
            rows.into_iter().take(limit as usize).collect()
        } else {
            rows
        };

        Ok(rows.iter().map(StoredArticle::summary).collect())
    }

    async fn search(&self, term: &str) -> Result<Vec<ArticleSummary>, ApiError> {
        let db = self.inner.lock().unwrap();
        let rows = ordered_newest_first(
            db.articles
                .iter()
                .filter(|stored| matches_term(stored, term))
                .cloned()
                .collect(),
        );

        Ok(rows.iter().map(StoredArticle::summary).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Article>, ApiError> {
        let db = self.inner.lock().unwrap();

        Ok(db.articles.iter().find(|a| a.id == id).map(|stored| Article {
            id: stored.id,
            title: stored.title.clone(),
            description: stored.description.clone(),
            image_url: stored.image_url.clone(),
            author: stored.author.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            image_type: stored.image_type.clone(),
            has_image: stored.image_data.is_some(),
        }))
    }

    async fn create(&self, article: &NewArticle) -> Result<i32, ApiError> {
        let mut db = self.inner.lock().unwrap();
        db.last_id += 1;
        let id = db.last_id;
        let now = Utc::now().naive_utc();

        db.articles.push(StoredArticle {
            id,
            title: article.title.clone(),
            description: article.description.clone(),
            image_url: article.image_url.clone(),
            author: article.author.clone(),
            image_data: article.image_data.clone(),
            image_type: article.image_type.clone(),
            created_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    async fn update(&self, id: i32, change: &ArticleChange) -> Result<(), ApiError> {
        let mut db = self.inner.lock().unwrap();

        if let Some(stored) = db.articles.iter_mut().find(|a| a.id == id) {
            stored.title = change.title.clone();
            stored.description = change.description.clone();
            stored.image_url = change.image_url.clone();
            stored.author = change.author.clone();

            match &change.image {
                ImagePatch::Keep => {}
                ImagePatch::Replace(upload) => {
                    stored.image_data = Some(upload.data.clone());
                    stored.image_type = Some(upload.content_type.clone());
                }
                ImagePatch::Clear => {
                    stored.image_data = None;
                    stored.image_type = None;
                }
            }

            stored.updated_at = Utc::now().naive_utc();
        }

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let mut db = self.inner.lock().unwrap();
        db.articles.retain(|a| a.id != id);
        Ok(())
    }

    async fn image(&self, id: i32) -> Result<Option<ArticleImage>, ApiError> {
        let db = self.inner.lock().unwrap();

        Ok(db
            .articles
            .iter()
            .find(|a| a.id == id)
            .and_then(|stored| {
                stored.image_data.as_ref().map(|data| ArticleImage {
                    data: data.clone(),
                    content_type: stored.image_type.clone(),
                })
            }))
    }
}

#[derive(Clone)]
pub struct MockAppState {
    pub articles: MockArticleRepository,
}

impl AppState for MockAppState {
    type Articles = MockArticleRepository;

    fn article_repo(&self) -> &MockArticleRepository {
        &self.articles
    }
}

pub fn create_test_app() -> (Router, MockArticleRepository) {
    let articles = MockArticleRepository::default();
    let state = MockAppState {
        articles: articles.clone(),
    };

    (newsdesk::create_app(state), articles)
}

pub const MULTIPART_BOUNDARY: &str = "newsdesk-test-boundary";

/// Builds a multipart/form-data body with the given text fields and an
/// optional `image` file part of (filename, content type, bytes).
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}
