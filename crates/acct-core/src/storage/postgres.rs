//! PostgreSQL storage backend.
//!
//! Delete rules live in the schema: legal entities, incomes and outcomes are
//! removed with their partner (`ON DELETE CASCADE`), application references
//! are cleared (`ON DELETE SET NULL`).

use super::{
    ApplicationStore, LedgerStore, LegalEntityStore, PartnerStore, StorageError, StorageResult,
    UserStore,
};
use crate::settlement::SettlementFigures;
use crate::types::{
    Application, ApplicationStatus, Income, LegalEntity, Outcome, Partner, PartnerRole, User,
};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use std::time::Duration;
use uuid::Uuid;

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// PostgreSQL-backed accounting storage.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect and create the schema if needed.
    pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("postgres connect failed: {e}")))?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS acct_partners (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                referral_percentage NUMERIC NOT NULL,
                is_executor BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS acct_legal_entities (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                partner_id UUID NOT NULL REFERENCES acct_partners (id) ON DELETE CASCADE,
                tax_number TEXT NOT NULL,
                legal_entity_percentage NUMERIC NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS acct_applications (
                id UUID PRIMARY KEY,
                status TEXT NOT NULL,
                customer_id UUID NULL REFERENCES acct_partners (id) ON DELETE SET NULL,
                executor_id UUID NULL REFERENCES acct_partners (id) ON DELETE SET NULL,
                giving_side_id UUID NULL REFERENCES acct_partners (id) ON DELETE SET NULL,
                receiver_id UUID NULL REFERENCES acct_legal_entities (id) ON DELETE SET NULL,
                sender_id UUID NULL REFERENCES acct_legal_entities (id) ON DELETE SET NULL,
                initial_sum NUMERIC NOT NULL,
                executor_commission NUMERIC NOT NULL,
                commission_with_interest NUMERIC NOT NULL,
                comment TEXT NOT NULL,
                is_documents BOOLEAN NOT NULL,
                settlement_sum NUMERIC NOT NULL,
                uncargo_sum NUMERIC NOT NULL,
                referral_amount NUMERIC NOT NULL,
                clean_income NUMERIC NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS acct_incomes (
                id UUID PRIMARY KEY,
                executor_id UUID NOT NULL REFERENCES acct_partners (id) ON DELETE CASCADE,
                amount NUMERIC NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS acct_outcomes (
                id UUID PRIMARY KEY,
                customer_id UUID NOT NULL REFERENCES acct_partners (id) ON DELETE CASCADE,
                amount NUMERIC NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS acct_users (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NULL,
                password_hash TEXT NOT NULL,
                otp_secret TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_acct_legal_entities_partner \
             ON acct_legal_entities (partner_id)",
            "CREATE INDEX IF NOT EXISTS idx_acct_incomes_executor ON acct_incomes (executor_id)",
            "CREATE INDEX IF NOT EXISTS idx_acct_outcomes_customer ON acct_outcomes (customer_id)",
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("delete from {table} failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}

fn ensure_updated(rows_affected: u64, kind: &str, id: Uuid) -> StorageResult<()> {
    if rows_affected == 0 {
        return Err(StorageError::NotFound(format!("{kind} {id}")));
    }
    Ok(())
}

fn map_sqlx_conflict(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StorageError::Conflict(db_err.message().to_string());
        }
    }
    StorageError::Backend(err.to_string())
}

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StorageError::Decode(format!("column {name}: {e}")))
}

fn partner_from_row(row: &PgRow) -> StorageResult<Partner> {
    Ok(Partner {
        id: col(row, "id")?,
        name: col(row, "name")?,
        referral_percentage: col(row, "referral_percentage")?,
        role: PartnerRole::from_executor_flag(col(row, "is_executor")?),
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn legal_entity_from_row(row: &PgRow) -> StorageResult<LegalEntity> {
    Ok(LegalEntity {
        id: col(row, "id")?,
        name: col(row, "name")?,
        partner_id: col(row, "partner_id")?,
        tax_number: col(row, "tax_number")?,
        legal_entity_percentage: col(row, "legal_entity_percentage")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn application_from_row(row: &PgRow) -> StorageResult<Application> {
    let status: String = col(row, "status")?;
    Ok(Application {
        id: col(row, "id")?,
        status: status
            .parse::<ApplicationStatus>()
            .map_err(StorageError::Decode)?,
        customer_id: col(row, "customer_id")?,
        executor_id: col(row, "executor_id")?,
        giving_side_id: col(row, "giving_side_id")?,
        receiver_id: col(row, "receiver_id")?,
        sender_id: col(row, "sender_id")?,
        initial_sum: col(row, "initial_sum")?,
        executor_commission: col(row, "executor_commission")?,
        commission_with_interest: col(row, "commission_with_interest")?,
        comment: col(row, "comment")?,
        is_documents: col(row, "is_documents")?,
        figures: SettlementFigures {
            settlement_sum: col(row, "settlement_sum")?,
            uncargo_sum: col(row, "uncargo_sum")?,
            referral_amount: col(row, "referral_amount")?,
            clean_income: col(row, "clean_income")?,
        },
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn income_from_row(row: &PgRow) -> StorageResult<Income> {
    Ok(Income {
        id: col(row, "id")?,
        executor_id: col(row, "executor_id")?,
        amount: col(row, "amount")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn outcome_from_row(row: &PgRow) -> StorageResult<Outcome> {
    Ok(Outcome {
        id: col(row, "id")?,
        customer_id: col(row, "customer_id")?,
        amount: col(row, "amount")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn user_from_row(row: &PgRow) -> StorageResult<User> {
    Ok(User {
        id: col(row, "id")?,
        username: col(row, "username")?,
        email: col(row, "email")?,
        password_hash: col(row, "password_hash")?,
        otp_secret: col(row, "otp_secret")?,
        created_at: col(row, "created_at")?,
    })
}

#[async_trait]
impl PartnerStore for PostgresStorage {
    async fn insert_partner(&self, partner: &Partner) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acct_partners
                (id, name, referral_percentage, is_executor, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(partner.id)
        .bind(&partner.name)
        .bind(partner.referral_percentage)
        .bind(partner.role.is_executor())
        .bind(partner.created_at)
        .bind(partner.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn update_partner(&self, partner: &Partner) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE acct_partners
               SET name = $2, referral_percentage = $3, is_executor = $4, updated_at = $5
             WHERE id = $1
            "#,
        )
        .bind(partner.id)
        .bind(&partner.name)
        .bind(partner.referral_percentage)
        .bind(partner.role.is_executor())
        .bind(partner.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        ensure_updated(result.rows_affected(), "partner", partner.id)
    }

    async fn get_partner(&self, id: Uuid) -> StorageResult<Option<Partner>> {
        sqlx::query("SELECT * FROM acct_partners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| partner_from_row(&row))
            .transpose()
    }

    async fn list_partners(&self) -> StorageResult<Vec<Partner>> {
        sqlx::query("SELECT * FROM acct_partners")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .iter()
            .map(partner_from_row)
            .collect()
    }

    async fn delete_partner(&self, id: Uuid) -> StorageResult<bool> {
        self.delete_by_id("acct_partners", id).await
    }
}

#[async_trait]
impl LegalEntityStore for PostgresStorage {
    async fn insert_legal_entity(&self, entity: &LegalEntity) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acct_legal_entities
                (id, name, partner_id, tax_number, legal_entity_percentage, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entity.id)
        .bind(&entity.name)
        .bind(entity.partner_id)
        .bind(&entity.tax_number)
        .bind(entity.legal_entity_percentage)
        .bind(entity.created_at)
        .bind(entity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn update_legal_entity(&self, entity: &LegalEntity) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE acct_legal_entities
               SET name = $2, partner_id = $3, tax_number = $4,
                   legal_entity_percentage = $5, updated_at = $6
             WHERE id = $1
            "#,
        )
        .bind(entity.id)
        .bind(&entity.name)
        .bind(entity.partner_id)
        .bind(&entity.tax_number)
        .bind(entity.legal_entity_percentage)
        .bind(entity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        ensure_updated(result.rows_affected(), "legal entity", entity.id)
    }

    async fn get_legal_entity(&self, id: Uuid) -> StorageResult<Option<LegalEntity>> {
        sqlx::query("SELECT * FROM acct_legal_entities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| legal_entity_from_row(&row))
            .transpose()
    }

    async fn list_legal_entities(&self) -> StorageResult<Vec<LegalEntity>> {
        sqlx::query("SELECT * FROM acct_legal_entities")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .iter()
            .map(legal_entity_from_row)
            .collect()
    }

    async fn delete_legal_entity(&self, id: Uuid) -> StorageResult<bool> {
        self.delete_by_id("acct_legal_entities", id).await
    }
}

#[async_trait]
impl ApplicationStore for PostgresStorage {
    async fn insert_application(&self, application: &Application) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acct_applications (
                id, status, customer_id, executor_id, giving_side_id, receiver_id, sender_id,
                initial_sum, executor_commission, commission_with_interest, comment, is_documents,
                settlement_sum, uncargo_sum, referral_amount, clean_income, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(application.customer_id)
        .bind(application.executor_id)
        .bind(application.giving_side_id)
        .bind(application.receiver_id)
        .bind(application.sender_id)
        .bind(application.initial_sum)
        .bind(application.executor_commission)
        .bind(application.commission_with_interest)
        .bind(&application.comment)
        .bind(application.is_documents)
        .bind(application.figures.settlement_sum)
        .bind(application.figures.uncargo_sum)
        .bind(application.figures.referral_amount)
        .bind(application.figures.clean_income)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn update_application(&self, application: &Application) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE acct_applications
               SET status = $2, customer_id = $3, executor_id = $4, giving_side_id = $5,
                   receiver_id = $6, sender_id = $7, initial_sum = $8, executor_commission = $9,
                   commission_with_interest = $10, comment = $11, is_documents = $12,
                   settlement_sum = $13, uncargo_sum = $14, referral_amount = $15,
                   clean_income = $16, updated_at = $17
             WHERE id = $1
            "#,
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(application.customer_id)
        .bind(application.executor_id)
        .bind(application.giving_side_id)
        .bind(application.receiver_id)
        .bind(application.sender_id)
        .bind(application.initial_sum)
        .bind(application.executor_commission)
        .bind(application.commission_with_interest)
        .bind(&application.comment)
        .bind(application.is_documents)
        .bind(application.figures.settlement_sum)
        .bind(application.figures.uncargo_sum)
        .bind(application.figures.referral_amount)
        .bind(application.figures.clean_income)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        ensure_updated(result.rows_affected(), "application", application.id)
    }

    async fn get_application(&self, id: Uuid) -> StorageResult<Option<Application>> {
        sqlx::query("SELECT * FROM acct_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| application_from_row(&row))
            .transpose()
    }

    async fn list_applications(&self) -> StorageResult<Vec<Application>> {
        sqlx::query("SELECT * FROM acct_applications")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .iter()
            .map(application_from_row)
            .collect()
    }

    async fn delete_application(&self, id: Uuid) -> StorageResult<bool> {
        self.delete_by_id("acct_applications", id).await
    }
}

#[async_trait]
impl LedgerStore for PostgresStorage {
    async fn insert_income(&self, income: &Income) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO acct_incomes (id, executor_id, amount, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(income.id)
        .bind(income.executor_id)
        .bind(income.amount)
        .bind(income.created_at)
        .bind(income.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn update_income(&self, income: &Income) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE acct_incomes SET executor_id = $2, amount = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(income.id)
        .bind(income.executor_id)
        .bind(income.amount)
        .bind(income.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        ensure_updated(result.rows_affected(), "income", income.id)
    }

    async fn get_income(&self, id: Uuid) -> StorageResult<Option<Income>> {
        sqlx::query("SELECT * FROM acct_incomes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| income_from_row(&row))
            .transpose()
    }

    async fn list_incomes(&self) -> StorageResult<Vec<Income>> {
        sqlx::query("SELECT * FROM acct_incomes")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .iter()
            .map(income_from_row)
            .collect()
    }

    async fn delete_income(&self, id: Uuid) -> StorageResult<bool> {
        self.delete_by_id("acct_incomes", id).await
    }

    async fn insert_outcome(&self, outcome: &Outcome) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO acct_outcomes (id, customer_id, amount, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(outcome.id)
        .bind(outcome.customer_id)
        .bind(outcome.amount)
        .bind(outcome.created_at)
        .bind(outcome.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn update_outcome(&self, outcome: &Outcome) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE acct_outcomes SET customer_id = $2, amount = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(outcome.id)
        .bind(outcome.customer_id)
        .bind(outcome.amount)
        .bind(outcome.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        ensure_updated(result.rows_affected(), "outcome", outcome.id)
    }

    async fn get_outcome(&self, id: Uuid) -> StorageResult<Option<Outcome>> {
        sqlx::query("SELECT * FROM acct_outcomes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| outcome_from_row(&row))
            .transpose()
    }

    async fn list_outcomes(&self) -> StorageResult<Vec<Outcome>> {
        sqlx::query("SELECT * FROM acct_outcomes")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .iter()
            .map(outcome_from_row)
            .collect()
    }

    async fn delete_outcome(&self, id: Uuid) -> StorageResult<bool> {
        self.delete_by_id("acct_outcomes", id).await
    }
}

#[async_trait]
impl UserStore for PostgresStorage {
    async fn insert_user(&self, user: &User) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO acct_users (id, username, email, password_hash, otp_secret, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.otp_secret)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE acct_users
               SET username = $2, email = $3, password_hash = $4, otp_secret = $5
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.otp_secret)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_conflict)?;
        ensure_updated(result.rows_affected(), "user", user.id)
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        sqlx::query("SELECT * FROM acct_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        sqlx::query("SELECT * FROM acct_users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|row| user_from_row(&row))
            .transpose()
    }
}
