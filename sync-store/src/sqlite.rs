//! SQLite storage backend for feedsync.

use crate::error::StorageError;
use crate::{
    search_text, NewsResourceDao, SearchHits, SearchIndex, TopicDao, VersionStore, VersionUpdate,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use sync_types::{ChangeListVersions, CollectionKind, NewsResource, Topic, Version};

/// SQLite-based local store.
///
/// Uses WAL mode so UI reads are not blocked by the sync engine's writes.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let location = path.to_str().ok_or_else(|| StorageError::InvalidPath {
            path: path.to_path_buf(),
        })?;

        let options = SqliteConnectOptions::from_str(location)
            .map_err(StorageError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        tracing::debug!(path = %path.display(), "opened local store");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StorageError::Database)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        // A single connection: every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                short_description TEXT NOT NULL,
                long_description TEXT NOT NULL,
                url TEXT NOT NULL,
                image_url TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_resources (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                url TEXT NOT NULL,
                header_image_url TEXT,
                publish_date TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                topics TEXT NOT NULL DEFAULT '[]'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_resource_topics (
                news_resource_id TEXT NOT NULL,
                topic_id TEXT NOT NULL,
                PRIMARY KEY (news_resource_id, topic_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS change_list_versions (
                collection TEXT PRIMARY KEY,
                version INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS search_index (
                kind TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                content TEXT NOT NULL,
                PRIMARY KEY (kind, entity_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_news_topics_topic ON news_resource_topics(topic_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_news_publish_date ON news_resources(publish_date)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl VersionStore for SqliteStore {
    async fn change_list_versions(&self) -> Result<ChangeListVersions, StorageError> {
        let rows: Vec<VersionRow> =
            sqlx::query_as("SELECT collection, version FROM change_list_versions")
                .fetch_all(&self.pool)
                .await?;

        Ok(fold_versions(rows))
    }

    async fn update_change_list_versions(
        &self,
        update: VersionUpdate,
    ) -> Result<ChangeListVersions, StorageError> {
        let mut tx = self.pool.begin().await?;

        // Write before reading so the read sees the latest committed record.
        // Seeded rows equal the never-synced default.
        for kind in CollectionKind::ALL {
            sqlx::query(
                "INSERT OR IGNORE INTO change_list_versions (collection, version) VALUES (?1, ?2)",
            )
            .bind(kind.as_str())
            .bind(Version::NEVER_SYNCED.value())
            .execute(&mut *tx)
            .await?;
        }

        let rows: Vec<VersionRow> =
            sqlx::query_as("SELECT collection, version FROM change_list_versions")
                .fetch_all(&mut *tx)
                .await?;
        let updated = update(fold_versions(rows));

        for kind in CollectionKind::ALL {
            sqlx::query("UPDATE change_list_versions SET version = ?2 WHERE collection = ?1")
                .bind(kind.as_str())
                .bind(updated.get(kind).value())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(updated)
    }
}

#[async_trait]
impl TopicDao for SqliteStore {
    async fn upsert_topics(&self, topics: Vec<Topic>) -> Result<(), StorageError> {
        if topics.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for topic in &topics {
            sqlx::query(
                r#"
                INSERT INTO topics (id, name, short_description, long_description, url, image_url)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    short_description = excluded.short_description,
                    long_description = excluded.long_description,
                    url = excluded.url,
                    image_url = excluded.image_url
                "#,
            )
            .bind(&topic.id)
            .bind(&topic.name)
            .bind(&topic.short_description)
            .bind(&topic.long_description)
            .bind(&topic.url)
            .bind(&topic.image_url)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::trace!(count = topics.len(), "upserted topics");
        Ok(())
    }

    async fn delete_topics(&self, ids: Vec<String>) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for id in &ids {
            sqlx::query("DELETE FROM topics WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM news_resource_topics WHERE topic_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::trace!(count = ids.len(), "deleted topics");
        Ok(())
    }

    async fn topics(&self) -> Result<Vec<Topic>, StorageError> {
        let rows: Vec<TopicRow> = sqlx::query_as(
            r#"
            SELECT id, name, short_description, long_description, url, image_url
            FROM topics
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Topic::from).collect())
    }

    async fn topic(&self, id: &str) -> Result<Option<Topic>, StorageError> {
        let row: Option<TopicRow> = sqlx::query_as(
            r#"
            SELECT id, name, short_description, long_description, url, image_url
            FROM topics
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Topic::from))
    }

    async fn topic_count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl NewsResourceDao for SqliteStore {
    async fn upsert_news_resources(&self, news: Vec<NewsResource>) -> Result<(), StorageError> {
        if news.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for resource in &news {
            let topics = serde_json::to_string(&resource.topics)?;
            sqlx::query(
                r#"
                INSERT INTO news_resources
                    (id, title, content, url, header_image_url, publish_date, resource_type, topics)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    content = excluded.content,
                    url = excluded.url,
                    header_image_url = excluded.header_image_url,
                    publish_date = excluded.publish_date,
                    resource_type = excluded.resource_type,
                    topics = excluded.topics
                "#,
            )
            .bind(&resource.id)
            .bind(&resource.title)
            .bind(&resource.content)
            .bind(&resource.url)
            .bind(&resource.header_image_url)
            .bind(&resource.publish_date)
            .bind(&resource.resource_type)
            .bind(&topics)
            .execute(&mut *tx)
            .await?;

            // Links are replaced wholesale with the resource
            sqlx::query("DELETE FROM news_resource_topics WHERE news_resource_id = ?1")
                .bind(&resource.id)
                .execute(&mut *tx)
                .await?;
            for topic_id in &resource.topics {
                sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO news_resource_topics (news_resource_id, topic_id)
                    VALUES (?1, ?2)
                    "#,
                )
                .bind(&resource.id)
                .bind(topic_id)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;

        tracing::trace!(count = news.len(), "upserted news resources");
        Ok(())
    }

    async fn delete_news_resources(&self, ids: Vec<String>) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for id in &ids {
            sqlx::query("DELETE FROM news_resources WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM news_resource_topics WHERE news_resource_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::trace!(count = ids.len(), "deleted news resources");
        Ok(())
    }

    async fn news_resources(&self) -> Result<Vec<NewsResource>, StorageError> {
        let rows: Vec<NewsRow> = sqlx::query_as(
            r#"
            SELECT id, title, content, url, header_image_url, publish_date, resource_type, topics
            FROM news_resources
            ORDER BY publish_date DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NewsResource::try_from).collect()
    }

    async fn news_resources_for_topic(
        &self,
        topic_id: &str,
    ) -> Result<Vec<NewsResource>, StorageError> {
        let rows: Vec<NewsRow> = sqlx::query_as(
            r#"
            SELECT n.id, n.title, n.content, n.url, n.header_image_url,
                   n.publish_date, n.resource_type, n.topics
            FROM news_resources n
            JOIN news_resource_topics t ON t.news_resource_id = n.id
            WHERE t.topic_id = ?1
            ORDER BY n.publish_date DESC, n.id ASC
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(NewsResource::try_from).collect()
    }

    async fn news_resource_count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_resources")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl SearchIndex for SqliteStore {
    async fn rebuild(&self) -> Result<u64, StorageError> {
        let topics = self.topics().await?;
        let news = self.news_resources().await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM search_index")
            .execute(&mut *tx)
            .await?;

        let mut indexed = 0u64;
        for topic in &topics {
            let content = search_text(&[
                &topic.name,
                &topic.short_description,
                &topic.long_description,
            ]);
            indexed += insert_index_row(&mut tx, CollectionKind::Topics, &topic.id, &content)
                .await?;
        }
        for resource in &news {
            let content = search_text(&[&resource.title, &resource.content]);
            indexed +=
                insert_index_row(&mut tx, CollectionKind::NewsResources, &resource.id, &content)
                    .await?;
        }
        tx.commit().await?;

        tracing::debug!(indexed, "rebuilt search index");
        Ok(indexed)
    }

    async fn search(&self, query: &str) -> Result<SearchHits, StorageError> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(SearchHits::default());
        }
        let pattern = format!("%{}%", escape_like(&query));

        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT kind, entity_id FROM search_index
            WHERE content LIKE ?1 ESCAPE '\'
            ORDER BY kind ASC, entity_id ASC
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let mut hits = SearchHits::default();
        for (kind, id) in rows {
            match kind.parse::<CollectionKind>() {
                Ok(CollectionKind::Topics) => hits.topic_ids.push(id),
                Ok(CollectionKind::NewsResources) => hits.news_resource_ids.push(id),
                Err(_) => tracing::warn!(%kind, "unknown kind in search index"),
            }
        }
        Ok(hits)
    }
}

async fn insert_index_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    kind: CollectionKind,
    id: &str,
    content: &str,
) -> Result<u64, StorageError> {
    let result = sqlx::query(
        r#"
        INSERT OR REPLACE INTO search_index (kind, entity_id, content)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(kind.as_str())
    .bind(id)
    .bind(content)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn fold_versions(rows: Vec<VersionRow>) -> ChangeListVersions {
    rows.into_iter()
        .fold(ChangeListVersions::new(), |versions, row| {
            match row.collection.parse::<CollectionKind>() {
                Ok(kind) => versions.with(kind, Version::new(row.version)),
                Err(_) => {
                    tracing::warn!(collection = %row.collection, "ignoring unknown version row");
                    versions
                }
            }
        })
}

#[derive(sqlx::FromRow)]
struct VersionRow {
    collection: String,
    version: i64,
}

#[derive(sqlx::FromRow)]
struct TopicRow {
    id: String,
    name: String,
    short_description: String,
    long_description: String,
    url: String,
    image_url: String,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Topic {
            id: row.id,
            name: row.name,
            short_description: row.short_description,
            long_description: row.long_description,
            url: row.url,
            image_url: row.image_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: String,
    title: String,
    content: String,
    url: String,
    header_image_url: Option<String>,
    publish_date: String,
    resource_type: String,
    topics: String,
}

impl TryFrom<NewsRow> for NewsResource {
    type Error = StorageError;

    fn try_from(row: NewsRow) -> Result<Self, Self::Error> {
        Ok(NewsResource {
            id: row.id,
            title: row.title,
            content: row.content,
            url: row.url,
            header_image_url: row.header_image_url,
            publish_date: row.publish_date,
            resource_type: row.resource_type,
            topics: serde_json::from_str(&row.topics)?,
        })
    }
}
