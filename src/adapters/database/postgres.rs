//! PostgreSQL adapter over the `loyalty_customers` and `loyalty_transactions` tables.

use std::time::Duration;

use sqlx::{
    postgres::{PgPool, PgPoolOptions, PgRow},
    Row,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    domain::{Customer, LoyaltyTransaction},
    ports::database::{DatabasePort, Error},
    settings::DatabaseSettings,
};

#[derive(Clone, Debug)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(settings))]
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, Error> {
        info!("connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .connect(&settings.url)
            .await?;

        info!("database connection pool created");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the customer and transaction tables if they do not exist yet
    pub async fn init_schema(&self) -> Result<(), Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS loyalty_customers (
                id UUID PRIMARY KEY,
                barcode_id TEXT NOT NULL UNIQUE,
                loyalty_points INTEGER DEFAULT 0 CHECK (loyalty_points >= 0),
                current_points_cache INTEGER DEFAULT 0 CHECK (current_points_cache >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS loyalty_transactions (
                id UUID PRIMARY KEY,
                customer_id UUID NOT NULL REFERENCES loyalty_customers(id),
                amount NUMERIC(10, 2) NOT NULL,
                points_earned INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_loyalty_transactions_customer \
             ON loyalty_transactions(customer_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl DatabasePort for PostgresDatabase {
    async fn get_customer_by_barcode(&self, barcode_id: &str) -> Result<Option<Customer>, Error> {
        let row = sqlx::query(
            "SELECT id, barcode_id, loyalty_points, current_points_cache \
             FROM loyalty_customers WHERE barcode_id = $1",
        )
        .bind(barcode_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| customer_from_row(&row)).transpose()
    }

    async fn insert_transaction(&self, transaction: LoyaltyTransaction) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO loyalty_transactions (id, customer_id, amount, points_earned, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(transaction.transaction_id)
        .bind(transaction.customer_id)
        .bind(transaction.amount_spent)
        .bind(points_to_column(transaction.points_earned)?)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_customer_balance(
        &self,
        customer_id: Uuid,
        new_balance: u32,
    ) -> Result<(), Error> {
        let balance = points_to_column(new_balance)?;
        let result = sqlx::query(
            "UPDATE loyalty_customers SET loyalty_points = $1, current_points_cache = $1 \
             WHERE id = $2",
        )
        .bind(balance)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::CustomerDoesNotExist(customer_id));
        }

        Ok(())
    }
}

/// Build a [`Customer`] from a `loyalty_customers` row
///
/// A `NULL` balance counts as zero points.
fn customer_from_row(row: &PgRow) -> Result<Customer, Error> {
    let loyalty_points: Option<i32> = row.try_get("loyalty_points")?;
    let current_points_cache: Option<i32> = row.try_get("current_points_cache")?;

    Ok(Customer {
        customer_id: row.try_get("id")?,
        barcode_id: row.try_get("barcode_id")?,
        loyalty_points: points_from_column(loyalty_points)?,
        current_points_cache: points_from_column(current_points_cache)?,
    })
}

fn points_to_column(points: u32) -> Result<i32, Error> {
    i32::try_from(points).map_err(|_| Error::Adapter(Box::new(InvalidPoints(points as i64))))
}

fn points_from_column(points: Option<i32>) -> Result<u32, Error> {
    let points = points.unwrap_or(0);
    u32::try_from(points).map_err(|_| Error::Adapter(Box::new(InvalidPoints(points as i64))))
}

/// Points value that cannot be represented on one side of the adapter
#[derive(Debug, thiserror::Error)]
#[error("points value {0} is out of range for the loyalty_customers table")]
pub struct InvalidPoints(i64);

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Adapter(Box::new(err))
    }
}
