use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    Account, HeightBand, IncomeBand, NewAccount, PartnerPreferences, ProfileFields, ProfileRecord,
};
use crate::services::store::{ProfileStore, StoreError};

const PROFILE_SELECT: &str = r#"
    SELECT
        u.id, u.full_name, u.dob, u.height, u.mother_tongue, u.religion,
        u.marital_status, u.gender, u.income, u.education, u.occupation,
        u.about, u.interests, u.profile_image, u.revision,
        u.profile_created_at, u.profile_updated_at,
        p.user_id AS pp_user_id,
        p.gender AS pp_gender,
        p.age_range_from AS pp_age_range_from,
        p.age_range_to AS pp_age_range_to,
        p.height_range_from AS pp_height_range_from,
        p.height_range_to AS pp_height_range_to,
        p.religion AS pp_religion,
        p.mother_tongue AS pp_mother_tongue,
        p.marital_status AS pp_marital_status,
        p.education AS pp_education,
        p.occupation AS pp_occupation,
        p.income AS pp_income
    FROM users u
    LEFT JOIN partner_preferences p ON p.user_id = u.id
"#;

/// PostgreSQL-backed profile store
///
/// Profiles live on the `users` row of their account; partner preferences
/// live in `partner_preferences`. Both are written in one transaction.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Distinguish a missing row from a stale or duplicate one after an
    /// update matched nothing
    async fn explain_miss(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        has_profile_is_conflict: bool,
    ) -> StoreError {
        let lookup = sqlx::query_scalar::<_, bool>(
            "SELECT profile_seq IS NOT NULL FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await;

        match lookup {
            Err(e) => e.into(),
            Ok(None) => StoreError::NotFound(format!("account {}", id)),
            Ok(Some(true)) if has_profile_is_conflict => {
                StoreError::Conflict(format!("account {} already has a profile", id))
            }
            Ok(Some(true)) => {
                StoreError::Conflict(format!("profile {} was modified concurrently", id))
            }
            Ok(Some(false)) => StoreError::NotFound(format!("profile {}", id)),
        }
    }

    async fn write_preferences(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        preferences: Option<&PartnerPreferences>,
    ) -> Result<(), StoreError> {
        let Some(prefs) = preferences else {
            sqlx::query("DELETE FROM partner_preferences WHERE user_id = $1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
            return Ok(());
        };

        let query = r#"
            INSERT INTO partner_preferences (
                user_id, gender, age_range_from, age_range_to,
                height_range_from, height_range_to, religion, mother_tongue,
                marital_status, education, occupation, income
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id)
            DO UPDATE SET
                gender = EXCLUDED.gender,
                age_range_from = EXCLUDED.age_range_from,
                age_range_to = EXCLUDED.age_range_to,
                height_range_from = EXCLUDED.height_range_from,
                height_range_to = EXCLUDED.height_range_to,
                religion = EXCLUDED.religion,
                mother_tongue = EXCLUDED.mother_tongue,
                marital_status = EXCLUDED.marital_status,
                education = EXCLUDED.education,
                occupation = EXCLUDED.occupation,
                income = EXCLUDED.income
        "#;

        sqlx::query(query)
            .bind(id)
            .bind(&prefs.gender)
            .bind(i16::from(prefs.age_range_from))
            .bind(i16::from(prefs.age_range_to))
            .bind(prefs.height_range_from.to_string())
            .bind(prefs.height_range_to.to_string())
            .bind(&prefs.religion)
            .bind(&prefs.mother_tongue)
            .bind(&prefs.marital_status)
            .bind(&prefs.education)
            .bind(&prefs.occupation)
            .bind(prefs.income.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Read a just-written profile on the writing transaction
    async fn read_written(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<ProfileRecord, StoreError> {
        let query = format!("{} WHERE u.id = $1 AND u.profile_seq IS NOT NULL", PROFILE_SELECT);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {}", id)))?;
        row_to_record(&row)
    }
}

/// Bind profile columns $2..$14 in the order used by the write queries
fn bind_profile<'q>(
    query: Query<'q, Postgres, PgArguments>,
    fields: &'q ProfileFields,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&fields.full_name)
        .bind(fields.dob)
        .bind(fields.height.to_string())
        .bind(&fields.mother_tongue)
        .bind(&fields.religion)
        .bind(&fields.marital_status)
        .bind(&fields.gender)
        .bind(fields.income.as_str())
        .bind(&fields.education)
        .bind(&fields.occupation)
        .bind(&fields.about)
        .bind(&fields.interests)
        .bind(&fields.profile_image)
}

fn column<T>(row: &PgRow, name: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(name)?
        .ok_or_else(|| StoreError::Corrupt(format!("column {} is unexpectedly null", name)))
}

fn height(row: &PgRow, name: &str) -> Result<HeightBand, StoreError> {
    column::<String>(row, name)?.parse().map_err(StoreError::Corrupt)
}

fn income(row: &PgRow, name: &str) -> Result<IncomeBand, StoreError> {
    column::<String>(row, name)?.parse().map_err(StoreError::Corrupt)
}

fn age(row: &PgRow, name: &str) -> Result<u8, StoreError> {
    let value: i16 = column(row, name)?;
    u8::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} out of range: {}", name, value)))
}

fn row_to_record(row: &PgRow) -> Result<ProfileRecord, StoreError> {
    let has_preferences = row.try_get::<Option<Uuid>, _>("pp_user_id")?.is_some();

    let partner_preferences = if has_preferences {
        Some(PartnerPreferences {
            gender: column(row, "pp_gender")?,
            age_range_from: age(row, "pp_age_range_from")?,
            age_range_to: age(row, "pp_age_range_to")?,
            height_range_from: height(row, "pp_height_range_from")?,
            height_range_to: height(row, "pp_height_range_to")?,
            religion: column(row, "pp_religion")?,
            mother_tongue: column(row, "pp_mother_tongue")?,
            marital_status: column(row, "pp_marital_status")?,
            education: column(row, "pp_education")?,
            occupation: column(row, "pp_occupation")?,
            income: income(row, "pp_income")?,
        })
    } else {
        None
    };

    Ok(ProfileRecord {
        id: row.try_get("id")?,
        fields: ProfileFields {
            full_name: column(row, "full_name")?,
            dob: column(row, "dob")?,
            height: height(row, "height")?,
            mother_tongue: column(row, "mother_tongue")?,
            religion: column(row, "religion")?,
            marital_status: column(row, "marital_status")?,
            gender: column(row, "gender")?,
            income: income(row, "income")?,
            education: column(row, "education")?,
            occupation: column(row, "occupation")?,
            about: column(row, "about")?,
            interests: row.try_get("interests")?,
            profile_image: row.try_get("profile_image")?,
            partner_preferences,
        },
        revision: row.try_get("revision")?,
        created_at: column(row, "profile_created_at")?,
        updated_at: column(row, "profile_updated_at")?,
    })
}

fn row_to_account(row: &PgRow) -> Result<Account, StoreError> {
    Ok(Account {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let query = r#"
            INSERT INTO users (id, email, password_hash, name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, created_at
        "#;

        let result = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.name)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => row_to_account(&row),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Conflict(
                format!("account with email {} already exists", account.email),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE id = $1
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = r#"
            SELECT id, email, password_hash, name, created_at
            FROM users
            WHERE email = $1
        "#;

        let row = sqlx::query(query).bind(email).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, StoreError> {
        let query = format!("{} WHERE u.id = $1 AND u.profile_seq IS NOT NULL", PROFILE_SELECT);

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn insert_profile(
        &self,
        id: Uuid,
        fields: &ProfileFields,
    ) -> Result<ProfileRecord, StoreError> {
        let query = r#"
            UPDATE users SET
                full_name = $2, dob = $3, height = $4, mother_tongue = $5,
                religion = $6, marital_status = $7, gender = $8, income = $9,
                education = $10, occupation = $11, about = $12, interests = $13,
                profile_image = $14,
                profile_seq = nextval('profile_seq'),
                revision = 1,
                profile_created_at = NOW(),
                profile_updated_at = NOW()
            WHERE id = $1 AND profile_seq IS NULL
        "#;

        let mut tx = self.pool.begin().await?;

        let result = bind_profile(sqlx::query(query).bind(id), fields)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::explain_miss(&mut tx, id, true).await);
        }

        Self::write_preferences(&mut tx, id, fields.partner_preferences.as_ref()).await?;
        let record = Self::read_written(&mut tx, id).await?;
        tx.commit().await?;

        tracing::debug!("Created profile {}", id);
        Ok(record)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        expected_revision: i64,
        fields: &ProfileFields,
    ) -> Result<ProfileRecord, StoreError> {
        let query = r#"
            UPDATE users SET
                full_name = $2, dob = $3, height = $4, mother_tongue = $5,
                religion = $6, marital_status = $7, gender = $8, income = $9,
                education = $10, occupation = $11, about = $12, interests = $13,
                profile_image = $14,
                revision = revision + 1,
                profile_updated_at = NOW()
            WHERE id = $1 AND profile_seq IS NOT NULL AND revision = $15
        "#;

        let mut tx = self.pool.begin().await?;

        let result = bind_profile(sqlx::query(query).bind(id), fields)
            .bind(expected_revision)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::explain_miss(&mut tx, id, false).await);
        }

        Self::write_preferences(&mut tx, id, fields.partner_preferences.as_ref()).await?;
        let record = Self::read_written(&mut tx, id).await?;
        tx.commit().await?;

        tracing::debug!("Updated profile {} from revision {}", id, expected_revision);
        Ok(record)
    }

    async fn list_profiles(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ProfileRecord>, u64), StoreError> {
        let query = format!(
            "{} WHERE u.profile_seq IS NOT NULL ORDER BY u.profile_seq LIMIT $1 OFFSET $2",
            PROFILE_SELECT
        );

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        // Page and count read the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE profile_seq IS NOT NULL")
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        let profiles = rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Listed {} profiles (total: {})", profiles.len(), total);

        Ok((profiles, u64::try_from(total).unwrap_or(0)))
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
