use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::admin::{Admin, Session, ROLE_TRAINER};
use crate::utils::crypto::{hash_password, hash_session_token, verify_password};
use crate::utils::token::generate_session_token;

const SESSION_DURATION_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verify credentials against the admins table. Inactive principals and
    /// unknown emails both come back as plain None; the route turns that
    /// into a single "invalid email or password" response.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Admin>> {
        let normalized = email.trim().to_lowercase();
        let Some(admin) = sqlx::query_as::<_, Admin>(
            r#"SELECT * FROM admins WHERE email = $1 AND is_active = TRUE"#,
        )
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let ok = verify_password(password, &admin.password_hash)
            .map_err(|e| Error::Internal(format!("Password verification failed: {}", e)))?;
        Ok(ok.then_some(admin))
    }

    /// Mint a session and return the raw cookie token. Only its hash hits
    /// the database.
    pub async fn create_session(&self, admin_id: Uuid) -> Result<String> {
        let raw_token = generate_session_token();
        let expires_at = Utc::now() + Duration::days(SESSION_DURATION_DAYS);

        sqlx::query(
            r#"INSERT INTO sessions (admin_id, token_hash, expires_at) VALUES ($1, $2, $3)"#,
        )
        .bind(admin_id)
        .bind(hash_session_token(&raw_token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(raw_token)
    }

    /// Resolve a raw cookie token to its session and principal. A session
    /// whose principal has been deactivated is hard-deleted on sight.
    pub async fn resolve_session(&self, raw_token: &str) -> Result<Option<(Session, Admin)>> {
        let token_hash = hash_session_token(raw_token);
        let Some(session) = sqlx::query_as::<_, Session>(
            r#"SELECT * FROM sessions WHERE token_hash = $1 AND expires_at > $2"#,
        )
        .bind(&token_hash)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let Some(admin) =
            sqlx::query_as::<_, Admin>(r#"SELECT * FROM admins WHERE id = $1"#)
                .bind(session.admin_id)
                .fetch_optional(&self.pool)
                .await?
        else {
            return Ok(None);
        };

        if !admin.is_active {
            self.delete_session(raw_token).await?;
            return Ok(None);
        }

        Ok(Some((session, admin)))
    }

    pub async fn delete_session(&self, raw_token: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE token_hash = $1"#)
            .bind(hash_session_token(raw_token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_trainers(&self) -> Result<Vec<Admin>> {
        let trainers = sqlx::query_as::<_, Admin>(
            r#"SELECT * FROM admins WHERE role = $1 ORDER BY created_at DESC"#,
        )
        .bind(ROLE_TRAINER)
        .fetch_all(&self.pool)
        .await?;
        Ok(trainers)
    }

    pub async fn create_trainer(
        &self,
        email: &str,
        name: &str,
        password: &str,
        created_by: Uuid,
    ) -> Result<Admin> {
        let normalized = email.trim().to_lowercase();

        let existing: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM admins WHERE email = $1"#)
                .bind(&normalized)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(Error::BadRequest("Email already exists".to_string()));
        }

        let password_hash = hash_password(password)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;

        let trainer = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (email, name, password_hash, role, is_active, created_by)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING *
            "#,
        )
        .bind(&normalized)
        .bind(name)
        .bind(&password_hash)
        .bind(ROLE_TRAINER)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(trainer)
    }

    /// Activate or deactivate a trainer. Only trainer rows are touchable,
    /// and deactivation purges the trainer's sessions.
    pub async fn set_trainer_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        sqlx::query(r#"UPDATE admins SET is_active = $1 WHERE id = $2 AND role = $3"#)
            .bind(is_active)
            .bind(id)
            .bind(ROLE_TRAINER)
            .execute(&self.pool)
            .await?;

        if !is_active {
            sqlx::query(r#"DELETE FROM sessions WHERE admin_id = $1"#)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}
