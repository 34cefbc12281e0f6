use async_trait::async_trait;
use diesel::define_sql_function;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Unsigned};

use super::traits::ArticleRepository;
use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{
    Article, ArticleChange, ArticleImage, ArticleSummary, ImagePatch, NewArticle,
};
use crate::schema::articles;

define_sql_function! {
    fn last_insert_id() -> Unsigned<BigInt>;
}

#[derive(Clone)]
pub struct MysqlArticleRepository {
    pool: DbPool,
}

impl MysqlArticleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for MysqlArticleRepository {
    async fn list(&self, limit: i64) -> Result<Vec<ArticleSummary>, ApiError> {
        let mut conn = self.pool.get()?;

        let mut query = articles::table
            .select((
                articles::id,
                articles::title,
                articles::description,
                articles::image_url,
                articles::author,
                articles::created_at,
                articles::updated_at,
                articles::image_data.is_not_null(),
            ))
            .order((articles::created_at.desc(), articles::id.desc()))
            .into_boxed();

        if limit > 0 {
            query = query.limit(limit);
        }

        let rows = query.load::<ArticleSummary>(&mut conn)?;
        Ok(rows)
    }

    async fn search(&self, term: &str) -> Result<Vec<ArticleSummary>, ApiError> {
        let mut conn = self.pool.get()?;
        let pattern = format!("%{term}%");

        let rows = articles::table
            .select((
                articles::id,
                articles::title,
                articles::description,
                articles::image_url,
                articles::author,
                articles::created_at,
                articles::updated_at,
                articles::image_data.is_not_null(),
            ))
            .filter(
                articles::title
                    .like(&pattern)
                    .or(articles::description.like(&pattern))
                    .or(articles::author.like(&pattern)),
            )
            .order((articles::created_at.desc(), articles::id.desc()))
            .load::<ArticleSummary>(&mut conn)?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Article>, ApiError> {
        let mut conn = self.pool.get()?;

        let row = articles::table
            .find(id)
            .select((
                articles::id,
                articles::title,
                articles::description,
                articles::image_url,
                articles::author,
                articles::created_at,
                articles::updated_at,
                articles::image_type,
                articles::image_data.is_not_null(),
            ))
            .first::<Article>(&mut conn)
            .optional()?;

        Ok(row)
    }

    async fn create(&self, article: &NewArticle) -> Result<i32, ApiError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(articles::table)
            .values(article)
            .execute(&mut conn)?;

        let id = diesel::select(last_insert_id()).get_result::<u64>(&mut conn)?;
        Ok(id as i32)
    }

    async fn update(&self, id: i32, change: &ArticleChange) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;
        let target = articles::table.find(id);

        match &change.image {
            ImagePatch::Keep => {
                diesel::update(target)
                    .set((
                        articles::title.eq(&change.title),
                        articles::description.eq(&change.description),
                        articles::image_url.eq(change.image_url.as_deref()),
                        articles::author.eq(&change.author),
                    ))
                    .execute(&mut conn)?;
            }
            ImagePatch::Replace(upload) => {
                diesel::update(target)
                    .set((
                        articles::title.eq(&change.title),
                        articles::description.eq(&change.description),
                        articles::image_url.eq(change.image_url.as_deref()),
                        articles::author.eq(&change.author),
                        articles::image_data.eq(Some(upload.data.as_slice())),
                        articles::image_type.eq(Some(upload.content_type.as_str())),
                    ))
                    .execute(&mut conn)?;
            }
            ImagePatch::Clear => {
                diesel::update(target)
                    .set((
                        articles::title.eq(&change.title),
                        articles::description.eq(&change.description),
                        articles::image_url.eq(change.image_url.as_deref()),
                        articles::author.eq(&change.author),
                        articles::image_data.eq(None::<Vec<u8>>),
                        articles::image_type.eq(None::<String>),
                    ))
                    .execute(&mut conn)?;
            }
        }

        Ok(())
    }

    async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let mut conn = self.pool.get()?;

        diesel::delete(articles::table.find(id)).execute(&mut conn)?;
        Ok(())
    }

    async fn image(&self, id: i32) -> Result<Option<ArticleImage>, ApiError> {
        let mut conn = self.pool.get()?;

        let row = articles::table
            .filter(articles::id.eq(id))
            .filter(articles::image_data.is_not_null())
            .select((
                articles::image_data.assume_not_null(),
                articles::image_type,
            ))
            .first::<(Vec<u8>, Option<String>)>(&mut conn)
            .optional()?;

        Ok(row.map(|(data, content_type)| ArticleImage { data, content_type }))
    }
}
