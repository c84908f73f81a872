use anyhow::{Context, Result};
use async_trait::async_trait;
use services::OwnerService;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{Owner, OwnerId};

const OWNER_COLUMNS: &str = "id, first_name, last_name, address, city, telephone";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageOptions {
    /// SQLite `LIKE` folds ASCII case unless this is set.
    pub case_sensitive_last_name: bool,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_options(database_url, StorageOptions::default()).await
    }

    pub async fn with_options(database_url: &str, options: StorageOptions) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let mut connect_options =
            SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        if options.case_sensitive_last_name {
            connect_options = connect_options.pragma("case_sensitive_like", "ON");
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_owners(&self) -> Result<Vec<Owner>> {
        let rows = sqlx::query(&format!("SELECT {OWNER_COLUMNS} FROM owners ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(owner_from_row).collect())
    }
}

fn owner_from_row(r: &SqliteRow) -> Owner {
    Owner {
        id: Some(OwnerId(r.get::<i64, _>(0))),
        first_name: r.get::<String, _>(1),
        last_name: r.get::<String, _>(2),
        address: r.get::<String, _>(3),
        city: r.get::<String, _>(4),
        telephone: r.get::<String, _>(5),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl OwnerService for Storage {
    async fn find_all_by_last_name_like(&self, pattern: &str) -> Result<Vec<Owner>> {
        let rows = sqlx::query(&format!(
            "SELECT {OWNER_COLUMNS} FROM owners WHERE last_name LIKE ? ORDER BY id ASC"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to look up owners matching '{pattern}'"))?;
        debug!(pattern, matches = rows.len(), "owner lookup");
        Ok(rows.iter().map(owner_from_row).collect())
    }

    async fn find_by_id(&self, owner_id: OwnerId) -> Result<Option<Owner>> {
        let row = sqlx::query(&format!("SELECT {OWNER_COLUMNS} FROM owners WHERE id = ?"))
            .bind(owner_id.0)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load owner {owner_id}"))?;
        Ok(row.as_ref().map(owner_from_row))
    }

    async fn save(&self, owner: Owner) -> Result<Owner> {
        let row = sqlx::query(&format!(
            "INSERT INTO owners ({OWNER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                address = excluded.address,
                city = excluded.city,
                telephone = excluded.telephone
             RETURNING {OWNER_COLUMNS}"
        ))
        .bind(owner.id.map(|id| id.0))
        .bind(&owner.first_name)
        .bind(&owner.last_name)
        .bind(&owner.address)
        .bind(&owner.city)
        .bind(&owner.telephone)
        .fetch_one(&self.pool)
        .await
        .context("failed to save owner")?;
        let saved = owner_from_row(&row);
        debug!(owner_id = ?saved.id, created = owner.is_new(), "owner saved");
        Ok(saved)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
