use diesel::mysql::MysqlConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use tracing::info;

/// Runs the fixed migration sequence. Each step is idempotent, so re-running
/// against an already-migrated schema is a no-op.
pub fn run(conn: &mut MysqlConnection) -> Result<(), diesel::result::Error> {
    info!("Running database migrations");

    create_articles_table_if_absent(conn)?;
    add_image_columns_if_absent(conn)?;

    info!("Migrations completed successfully");
    Ok(())
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

fn table_exists(conn: &mut MysqlConnection, table: &str) -> Result<bool, diesel::result::Error> {
    let row: CountRow = diesel::sql_query(
        "SELECT COUNT(*) AS n FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
    )
    .bind::<Text, _>(table)
    .get_result(conn)?;

    Ok(row.n > 0)
}

fn column_exists(
    conn: &mut MysqlConnection,
    table: &str,
    column: &str,
) -> Result<bool, diesel::result::Error> {
    let row: CountRow = diesel::sql_query(
        "SELECT COUNT(*) AS n FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?",
    )
    .bind::<Text, _>(table)
    .bind::<Text, _>(column)
    .get_result(conn)?;

    Ok(row.n > 0)
}

fn create_articles_table_if_absent(
    conn: &mut MysqlConnection,
) -> Result<(), diesel::result::Error> {
    if table_exists(conn, "articles")? {
        info!("articles table already exists");
        return Ok(());
    }

    info!("Creating articles table");

    diesel::sql_query(
        "CREATE TABLE articles (
            id INT AUTO_INCREMENT PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            description TEXT NOT NULL,
            image_url VARCHAR(255),
            author VARCHAR(100) NOT NULL,
            image_data MEDIUMBLOB,
            image_type VARCHAR(100),
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci",
    )
    .execute(conn)?;

    info!("articles table created");
    Ok(())
}

fn add_image_columns_if_absent(conn: &mut MysqlConnection) -> Result<(), diesel::result::Error> {
    if column_exists(conn, "articles", "image_data")? {
        info!("Image columns already exist");
        return Ok(());
    }

    info!("Adding image_data and image_type columns to articles table");

    diesel::sql_query(
        "ALTER TABLE articles \
         ADD COLUMN image_data MEDIUMBLOB AFTER author, \
         ADD COLUMN image_type VARCHAR(100) AFTER image_data",
    )
    .execute(conn)?;

    info!("Image columns added");
    Ok(())
}
