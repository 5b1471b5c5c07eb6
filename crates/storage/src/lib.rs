use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, Row, SqlitePool};
use thiserror::Error;

use inspecta_core::Inspection;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on inspection rows.
    pub fn inspections(&self) -> InspectionRepository {
        InspectionRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository responsible for the `inspections` table.
///
/// The company name is resolved through a LEFT JOIN on every read so that a
/// row whose company cannot be found still loads, with `company_name` left
/// unset for the serialization fallback to handle.
#[derive(Clone)]
pub struct InspectionRepository {
    pool: SqlitePool,
}

const SELECT_JOINED: &str = "SELECT i.id, i.date, i.company_id, c.name AS company_name, \
     i.score, i.notes, i.inspector \
     FROM inspections AS i \
     LEFT JOIN companies AS c ON c.id = i.company_id";

impl InspectionRepository {
    /// Returns every stored inspection in storage-default order.
    pub async fn list_all(&self) -> Result<Vec<Inspection>, InspectionError> {
        let rows = sqlx::query_as::<_, InspectionRow>(SELECT_JOINED)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(InspectionRow::into_domain).collect())
    }

    /// Loads a single inspection by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Inspection>, InspectionError> {
        let query = format!("{SELECT_JOINED} WHERE i.id = ?");
        let row = sqlx::query_as::<_, InspectionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(InspectionRow::into_domain))
    }

    /// Inserts a new inspection and returns the persisted entity, including
    /// its assigned id and resolved company name.
    ///
    /// Missing notes are stored as the empty string. An unknown company id
    /// fails the insert with [`InspectionError::MissingCompany`].
    pub async fn create(&self, record: NewInspection<'_>) -> Result<Inspection, InspectionError> {
        let result = sqlx::query(
            "INSERT INTO inspections (date, company_id, score, notes, inspector) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(to_rfc3339(record.date))
        .bind(record.company_id)
        .bind(record.score)
        .bind(record.notes.unwrap_or_default())
        .bind(record.inspector)
        .fetch_one(&self.pool)
        .await;

        let row = result.map_err(|err| match err {
            sqlx::Error::Database(db_err) => {
                if db_err.code().as_deref() == Some("787") {
                    InspectionError::MissingCompany
                } else {
                    InspectionError::Database(sqlx::Error::Database(db_err))
                }
            }
            other => InspectionError::Database(other),
        })?;

        let id: i64 = row.get("id");
        self.find_by_id(id)
            .await?
            .ok_or(InspectionError::RowVanished(id))
    }

    /// Removes the inspection with the given id if present; returns whether a
    /// row was found and removed. A missing id is a normal `false` outcome.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, InspectionError> {
        let result = sqlx::query("DELETE FROM inspections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Data required to insert a new inspection row.
#[derive(Clone)]
pub struct NewInspection<'a> {
    pub company_id: i64,
    pub score: i64,
    pub notes: Option<&'a str>,
    pub inspector: &'a str,
    pub date: DateTime<Utc>,
}

/// Database row for an inspection joined with its company name.
#[derive(Debug, sqlx::FromRow)]
struct InspectionRow {
    id: i64,
    date: DateTime<Utc>,
    company_id: i64,
    company_name: Option<String>,
    score: i64,
    notes: Option<String>,
    inspector: String,
}

impl InspectionRow {
    fn into_domain(self) -> Inspection {
        Inspection {
            id: self.id,
            date: self.date,
            company_id: self.company_id,
            company_name: self.company_name,
            score: self.score,
            notes: self.notes,
            inspector: self.inspector,
        }
    }
}

/// Errors that can occur while operating on inspection rows.
#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("referenced company does not exist")]
    MissingCompany,
    #[error("inspection {0} disappeared between insert and read-back")]
    RowVanished(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Named in-memory databases keep concurrently running tests isolated
    // while letting the pool's connections share one schema.
    fn mem_url(name: &str) -> String {
        format!("sqlite:file:{name}?mode=memory&cache=shared")
    }

    async fn setup_db(name: &str) -> Database {
        let db = Database::connect(&mem_url(name)).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        seed_company(&db, 1, "Acme SA").await;
        db
    }

    async fn seed_company(db: &Database, id: i64, name: &str) {
        sqlx::query("INSERT INTO companies (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(db.pool())
            .await
            .expect("insert company");
    }

    fn new_inspection(company_id: i64) -> NewInspection<'static> {
        NewInspection {
            company_id,
            score: 4,
            notes: Some("sin novedades"),
            inspector: "Ana",
            date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_resolves_company() {
        let db = setup_db("create_assigns").await;
        let repo = db.inspections();

        let created = repo.create(new_inspection(1)).await.expect("create");
        assert!(created.id > 0);
        assert_eq!(created.company_id, 1);
        assert_eq!(created.company_name.as_deref(), Some("Acme SA"));
        assert_eq!(created.score, 4);
        assert_eq!(created.notes.as_deref(), Some("sin novedades"));
        assert_eq!(created.inspector, "Ana");
    }

    #[tokio::test]
    async fn create_defaults_notes_to_empty() {
        let db = setup_db("create_notes").await;
        let repo = db.inspections();

        let record = NewInspection {
            notes: None,
            ..new_inspection(1)
        };
        let created = repo.create(record).await.expect("create");
        assert_eq!(created.notes.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn create_errors_when_company_missing() {
        let db = setup_db("create_fk").await;
        let repo = db.inspections();

        let outcome = repo.create(new_inspection(999)).await;
        assert!(matches!(outcome, Err(InspectionError::MissingCompany)));

        let all = repo.list_all().await.expect("list");
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn list_all_round_trips_fields() {
        let db = setup_db("list_all").await;
        let repo = db.inspections();

        let first = repo.create(new_inspection(1)).await.expect("create");
        let second = repo
            .create(NewInspection {
                score: 2,
                inspector: "Luis",
                ..new_inspection(1)
            })
            .await
            .expect("create");

        let all = repo.list_all().await.expect("list");
        assert_eq!(all.len(), 2);
        assert!(all.contains(&first));
        assert!(all.contains(&second));
    }

    #[tokio::test]
    async fn delete_by_id_reports_presence() {
        let db = setup_db("delete_by_id").await;
        let repo = db.inspections();

        let created = repo.create(new_inspection(1)).await.expect("create");
        assert!(repo.delete_by_id(created.id).await.expect("delete"));
        assert!(!repo.delete_by_id(created.id).await.expect("redelete"));
        assert!(!repo.delete_by_id(12345).await.expect("missing"));
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_missing_row() {
        let db = setup_db("find_missing").await;
        let found = db.inspections().find_by_id(42).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn rows_survive_reconnect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite:{}?mode=rwc",
            dir.path().join("inspecta.db").display()
        );

        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        seed_company(&db, 1, "Acme SA").await;
        let created = db
            .inspections()
            .create(new_inspection(1))
            .await
            .expect("create");
        db.pool().close().await;

        let reopened = Database::connect(&url).await.expect("reconnect");
        let all = reopened.inspections().list_all().await.expect("list");
        assert_eq!(all, vec![created]);
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = Database::connect(&mem_url("migrations")).await.expect("connect");
        db.run_migrations().await.expect("migrations");

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('companies', 'inspections')",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 2);
    }
}
