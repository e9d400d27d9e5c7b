use crate::db::traits::AuthStore;
use crate::types::{AppError, RefreshToken, Result, Role, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database, Row};
use uuid::Uuid;

/// libsql-backed user directory and renewal store.
pub struct LibsqlStore {
    // Kept alive alongside the shared connection; dropping the Database
    // would tear down an in-memory database out from under `conn`.
    _db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// Opens (or creates) a local database file and initializes the
    /// schema, including role seeding.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { _db: db, conn };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// Ephemeral in-memory database, used by the test suite.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    /// A fresh connection to the underlying database.
    pub fn connection(&self) -> Result<Connection> {
        Ok(self.conn.clone())
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                account_non_locked INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS roles (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create roles table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL,
                role_id TEXT NOT NULL,
                PRIMARY KEY (user_id, role_id),
                FOREIGN KEY (user_id) REFERENCES users(id),
                FOREIGN KEY (role_id) REFERENCES roles(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create user_roles table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS refresh_tokens (
                id TEXT PRIMARY KEY,
                token TEXT UNIQUE NOT NULL,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                revoked INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create refresh_tokens table: {}", e)))?;

        self.seed_roles(&conn).await?;

        Ok(())
    }

    /// Roles are reference data: present from the first start, never
    /// deleted in normal flow.
    async fn seed_roles(&self, conn: &Connection) -> Result<()> {
        for (name, description) in [
            ("ROLE_USER", "Default role assigned at registration"),
            ("ROLE_ADMIN", "Administrative role, granted explicitly"),
        ] {
            conn.execute(
                "INSERT OR IGNORE INTO roles (id, name, description) VALUES (?, ?, ?)",
                (Uuid::new_v4().to_string(), name, description),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to seed role {}: {}", name, e)))?;
        }
        Ok(())
    }

    fn user_from_row(row: &Row) -> Result<User> {
        let created: i64 = row.get(6).map_err(|e| AppError::Database(e.to_string()))?;
        let updated: i64 = row.get(7).map_err(|e| AppError::Database(e.to_string()))?;
        Ok(User {
            id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            username: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            password_hash: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
            enabled: row.get::<i64>(4).map_err(|e| AppError::Database(e.to_string()))? != 0,
            account_non_locked: row
                .get::<i64>(5)
                .map_err(|e| AppError::Database(e.to_string()))?
                != 0,
            audit: crate::types::AuditInfo {
                created_at: timestamp(created),
                updated_at: timestamp(updated),
            },
        })
    }

    async fn query_user(&self, sql: &str, param: &str) -> Result<Option<User>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(sql, [param])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, enabled, account_non_locked, created_at, updated_at";

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[async_trait]
impl AuthStore for LibsqlStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_user(
            &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
            username,
        )
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.query_user(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            email,
        )
        .await
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.query_user(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            id,
        )
        .await
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.find_user_by_username(username).await?.is_some())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.find_user_by_email(email).await?.is_some())
    }

    async fn create_user(&self, user: &User, default_role: &str) -> Result<()> {
        let conn = self.connection()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO users (id, username, email, password_hash, enabled, account_non_locked, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                user.id.as_str(),
                user.username.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.enabled as i64,
                user.account_non_locked as i64,
                user.audit.created_at.timestamp(),
                user.audit.updated_at.timestamp(),
            ),
        )
        .await
        .map_err(|e| {
            // Unique constraint backstop; the service checks first.
            if e.to_string().contains("UNIQUE") {
                AppError::Duplicate(format!("User already exists: {}", user.username))
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;

        let mut rows = tx
            .query("SELECT id FROM roles WHERE name = ?", [default_role])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query role: {}", e)))?;
        let role_id: String = match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            None => return Err(AppError::NotFound("Default role not found".to_string())),
        };

        tx.execute(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)",
            (user.id.as_str(), role_id.as_str()),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to assign role: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit user creation: {}", e)))?;

        tracing::info!("created user '{}'", user.username);
        Ok(())
    }

    async fn roles_for_user(&self, user_id: &str) -> Result<Vec<Role>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT r.id, r.name, r.description
                 FROM roles r
                 JOIN user_roles ur ON ur.role_id = r.id
                 WHERE ur.user_id = ?
                 ORDER BY r.name",
                [user_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query roles: {}", e)))?;

        let mut roles = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            roles.push(Role {
                id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                name: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
                description: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            });
        }
        Ok(roles)
    }

    async fn add_role_to_user(&self, user_id: &str, role_name: &str) -> Result<()> {
        let role = self
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role not found: {}", role_name)))?;

        let conn = self.connection()?;
        conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)",
            (user_id, role.id.as_str()),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to grant role: {}", e)))?;

        tracing::info!("granted role '{}' to user {}", role_name, user_id);
        Ok(())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT id, name, description FROM roles WHERE name = ?",
                [name],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query role: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(Role {
                id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                name: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
                description: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO refresh_tokens (id, token, user_id, expires_at, revoked, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                token.id.as_str(),
                token.token.as_str(),
                token.user_id.as_str(),
                token.expires_at.timestamp(),
                token.revoked as i64,
                token.created_at.timestamp(),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to store refresh token: {}", e)))?;
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let conn = self.connection()?;
        let mut rows = conn
            .query(
                "SELECT id, token, user_id, expires_at, revoked, created_at
                 FROM refresh_tokens WHERE token = ?",
                [token],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query refresh token: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => {
                let expires: i64 = row.get(3).map_err(|e| AppError::Database(e.to_string()))?;
                let created: i64 = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;
                Ok(Some(RefreshToken {
                    id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                    token: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
                    user_id: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
                    expires_at: timestamp(expires),
                    revoked: row
                        .get::<i64>(4)
                        .map_err(|e| AppError::Database(e.to_string()))?
                        != 0,
                    created_at: timestamp(created),
                }))
            }
            None => Ok(None),
        }
    }

    async fn delete_refresh_token(&self, id: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM refresh_tokens WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete refresh token: {}", e)))?;
        Ok(())
    }

    async fn delete_refresh_tokens_for_user(&self, user_id: &str) -> Result<u64> {
        let conn = self.connection()?;
        let deleted = conn
            .execute("DELETE FROM refresh_tokens WHERE user_id = ?", [user_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete refresh tokens: {}", e)))?;
        Ok(deleted)
    }
}
