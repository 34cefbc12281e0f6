pub mod articles;
pub mod traits;

pub use articles::MysqlArticleRepository;
pub use traits::ArticleRepository;
