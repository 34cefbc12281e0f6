use axum::{
    Router,
    extract::{Form, Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::ApiError;
use crate::models::{ArticleChange, ImagePatch, ImageUpload, NewArticle};
use crate::repositories::ArticleRepository;
use crate::{AppState, config::DbConfig, db, media};

/// Listing cap when the caller does not ask for one.
const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
struct ListArticlesQuery {
    search: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ArticleSummaryResponse {
    id: i32,
    title: String,
    description: String,
    image_url: Option<String>,
    author: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    has_image: bool,
}

#[derive(Debug, Serialize)]
struct ListArticlesResponse {
    articles: Vec<ArticleSummaryResponse>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct ArticleIdResponse {
    id: i32,
}

#[derive(Debug, Serialize)]
struct DeleteArticleResponse {
    success: bool,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TestConnectionForm {
    use_env: Option<String>,
    host: Option<String>,
    port: Option<String>,
    username: Option<String>,
    password: Option<String>,
    dbname: Option<String>,
    sslmode: Option<String>,
}

#[derive(Debug, Serialize)]
struct TestConnectionResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Fields accepted by the create and update forms. Required-field checks
/// happen in the model constructors, not here.
#[derive(Debug, Default)]
struct ArticleForm {
    title: String,
    description: String,
    image_url: Option<String>,
    author: String,
    image: Option<ImageUpload>,
    remove_image: bool,
}

async fn read_article_form(mut multipart: Multipart) -> Result<ArticleForm, ApiError> {
    fn parse_error(err: axum::extract::multipart::MultipartError) -> ApiError {
        ApiError::BadRequest(format!("Error parsing form: {err}"))
    }

    let mut form = ArticleForm::default();

    while let Some(field) = multipart.next_field().await.map_err(parse_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => form.title = field.text().await.map_err(parse_error)?,
            "description" => form.description = field.text().await.map_err(parse_error)?,
            "author" => form.author = field.text().await.map_err(parse_error)?,
            "image_url" => form.image_url = Some(field.text().await.map_err(parse_error)?),
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let declared = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(parse_error)?;

                // Browsers submit an empty part when no file was chosen.
                if !data.is_empty() {
                    form.image = Some(ImageUpload {
                        data: data.to_vec(),
                        content_type: media::upload_content_type(&filename, declared.as_deref()),
                    });
                }
            }
            "remove_image" => {
                form.remove_image = field.text().await.map_err(parse_error)? == "true";
            }
            _ => {}
        }
    }

    Ok(form)
}

fn summary_response(item: crate::models::ArticleSummary) -> ArticleSummaryResponse {
    ArticleSummaryResponse {
        id: item.id,
        title: item.title,
        description: item.description,
        image_url: item.image_url,
        author: item.author,
        created_at: item.created_at,
        updated_at: item.updated_at,
        has_image: item.has_image,
    }
}

#[instrument(skip_all, fields(search = query.search.as_deref(), limit = query.limit))]
async fn list_articles<S: AppState>(
    State(state): State<S>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<ResponseJson<ListArticlesResponse>, ApiError> {
    debug!("Processing article list request");

    let repo = state.article_repo();
    let items = match query.search.as_deref().filter(|term| !term.is_empty()) {
        Some(term) => repo.search(term).await?,
        None => repo.list(query.limit.unwrap_or(DEFAULT_LIST_LIMIT)).await?,
    };

    let articles: Vec<_> = items.into_iter().map(summary_response).collect();

    info!(count = articles.len(), "Retrieved article list");

    Ok(ResponseJson(ListArticlesResponse {
        count: articles.len(),
        articles,
    }))
}

/// Detail view; the stored MIME type stays internal, like the blob itself.
#[derive(Debug, Serialize)]
struct ArticleResponse {
    id: i32,
    title: String,
    description: String,
    image_url: Option<String>,
    author: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    has_image: bool,
}

#[instrument(skip_all, fields(id = id))]
async fn get_article<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<ArticleResponse>, ApiError> {
    debug!("Processing get article request");

    let article = state.article_repo().find_by_id(id).await?;

    match article {
        Some(article) => Ok(ResponseJson(ArticleResponse {
            id: article.id,
            title: article.title,
            description: article.description,
            image_url: article.image_url,
            author: article.author,
            created_at: article.created_at,
            updated_at: article.updated_at,
            has_image: article.has_image,
        })),
        None => {
            debug!("Article not found");
            Err(ApiError::NotFound)
        }
    }
}

#[instrument(skip_all)]
async fn create_article<S: AppState>(
    State(state): State<S>,
    multipart: Multipart,
) -> Result<ResponseJson<ArticleIdResponse>, ApiError> {
    let form = read_article_form(multipart).await?;

    let new_article = NewArticle::new(
        form.title,
        form.description,
        form.author,
        form.image_url,
        form.image,
    )?;

    let id = state.article_repo().create(&new_article).await?;
    info!(id, "Article created");

    Ok(ResponseJson(ArticleIdResponse { id }))
}

#[instrument(skip_all, fields(id = id))]
async fn update_article<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<ResponseJson<ArticleIdResponse>, ApiError> {
    let form = read_article_form(multipart).await?;

    let image = if let Some(upload) = form.image {
        ImagePatch::Replace(upload)
    } else if form.remove_image {
        ImagePatch::Clear
    } else {
        ImagePatch::Keep
    };

    let change = ArticleChange::new(
        form.title,
        form.description,
        form.author,
        form.image_url,
        image,
    )?;

    state.article_repo().update(id, &change).await?;
    info!(id, "Article updated");

    Ok(ResponseJson(ArticleIdResponse { id }))
}

#[instrument(skip_all, fields(id = id))]
async fn delete_article<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<DeleteArticleResponse>, ApiError> {
    state.article_repo().delete(id).await?;
    info!(id, "Article deleted");

    Ok(ResponseJson(DeleteArticleResponse {
        success: true,
        message: "Article deleted successfully".to_string(),
    }))
}

#[instrument(skip_all, fields(id = id))]
async fn get_article_image<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let image = state.article_repo().image(id).await?;

    match image {
        Some(image) => {
            let content_type = match image.content_type.filter(|t| !t.is_empty()) {
                Some(stored) => stored,
                None => media::sniff_content_type(&image.data).to_string(),
            };

            Ok(([(header::CONTENT_TYPE, content_type)], image.data).into_response())
        }
        None => {
            debug!("No stored image for article");
            Err(ApiError::NotFound)
        }
    }
}

#[instrument(skip_all, fields(use_env = form.use_env.as_deref()))]
async fn test_connection(
    Form(form): Form<TestConnectionForm>,
) -> ResponseJson<TestConnectionResponse> {
    let config = if form.use_env.as_deref() == Some("true") {
        DbConfig::from_env()
    } else {
        DbConfig {
            host: form.host.unwrap_or_default(),
            port: form.port.unwrap_or_default(),
            username: form.username.unwrap_or_default(),
            password: form.password.unwrap_or_default(),
            database: form.dbname.unwrap_or_default(),
            ssl_mode: form.sslmode.unwrap_or_default(),
            ca_cert_path: None,
            ca_cert: None,
            skip_verify: false,
        }
    };

    match db::test_connection(&config) {
        Ok(()) => {
            info!("Connection test succeeded");
            ResponseJson(TestConnectionResponse {
                success: true,
                message: Some("Connection successful!".to_string()),
                error: None,
            })
        }
        Err(err) => {
            info!(error = %err, "Connection test failed");
            ResponseJson(TestConnectionResponse {
                success: false,
                message: None,
                error: Some(err.to_string()),
            })
        }
    }
}

pub fn create_api_v1_router<S: AppState>() -> Router<S> {
    Router::new()
        .route(
            "/articles",
            get(list_articles::<S>).post(create_article::<S>),
        )
        .route(
            "/articles/{id}",
            get(get_article::<S>)
                .put(update_article::<S>)
                .delete(delete_article::<S>),
        )
        .route("/articles/{id}/image", get(get_article_image::<S>))
        .route("/test-connection", post(test_connection))
}
