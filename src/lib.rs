use axum::Router;

pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod validation;

use repositories::{ArticleRepository, MysqlArticleRepository};

/// Seam between the HTTP surface and the article store; tests substitute an
/// in-memory repository here.
pub trait AppState: Clone + Send + Sync + 'static {
    type Articles: ArticleRepository;

    fn article_repo(&self) -> &Self::Articles;
}

#[derive(Clone)]
pub struct DefaultAppState {
    articles: MysqlArticleRepository,
}

impl DefaultAppState {
    pub fn new(pool: db::DbPool) -> Self {
        Self {
            articles: MysqlArticleRepository::new(pool),
        }
    }
}

impl AppState for DefaultAppState {
    type Articles = MysqlArticleRepository;

    fn article_repo(&self) -> &MysqlArticleRepository {
        &self.articles
    }
}

pub fn create_app<S: AppState>(state: S) -> Router {
    routes::create_router().with_state(state)
}
