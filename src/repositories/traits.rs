use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::{Article, ArticleChange, ArticleImage, ArticleSummary, NewArticle};

#[async_trait]
pub trait ArticleRepository: Clone + Send + Sync + 'static {
    /// Articles ordered by creation time, newest first. A non-positive limit
    /// means unbounded.
    async fn list(&self, limit: i64) -> Result<Vec<ArticleSummary>, ApiError>;

    /// Case-insensitivity follows the column collation.
    async fn search(&self, term: &str) -> Result<Vec<ArticleSummary>, ApiError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Article>, ApiError>;

    /// Returns the database-assigned id.
    async fn create(&self, article: &NewArticle) -> Result<i32, ApiError>;

    /// Overwrites the text fields unconditionally; the image columns follow
    /// the change's [`ImagePatch`](crate::models::ImagePatch). Updating a
    /// missing id is not an error.
    async fn update(&self, id: i32, change: &ArticleChange) -> Result<(), ApiError>;

    /// Hard delete; a missing id is not distinguished.
    async fn delete(&self, id: i32) -> Result<(), ApiError>;

    /// The stored blob, only where one is present.
    async fn image(&self, id: i32) -> Result<Option<ArticleImage>, ApiError>;
}
