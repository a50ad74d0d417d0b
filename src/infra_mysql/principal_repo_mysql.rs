use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Reads members owned by the membership service. Soft-deleted rows are skipped.
pub struct MySqlPrincipalRepo {
    pool: MySqlPool,
}

impl MySqlPrincipalRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlPrincipalRepo { pool }
    }

    fn row_to_principal(row: MySqlRow) -> Result<Principal, AuthError> {
        let subject: String = row
            .try_get("phone_number")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let secret_hash: String = row
            .try_get("login_password")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(Principal {
            subject,
            secret_hash,
            authorities: vec![Authority(role)],
            active: true,
        })
    }
}

#[async_trait::async_trait]
impl PrincipalRepo for MySqlPrincipalRepo {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<Principal>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT phone_number, login_password, role
FROM member
WHERE phone_number = ? AND deleted_at IS NULL
"#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_principal).transpose()
    }
}
