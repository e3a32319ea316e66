use uuid::Uuid;

use crate::domain::{Customer, LoyaltyTransaction};

#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort {
    /// Customer with the given barcode, or `None` if nobody is registered under it
    async fn get_customer_by_barcode(&self, barcode_id: &str) -> Result<Option<Customer>, Error>;
    /// Append a transaction to the log
    async fn insert_transaction(&self, transaction: LoyaltyTransaction) -> Result<(), Error>;
    /// Overwrite both the balance and the cached balance of a customer
    ///
    /// Adapters may reject balances above [`crate::domain::MAX_BALANCE`].
    async fn update_customer_balance(&self, customer_id: Uuid, new_balance: u32)
        -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The customer targeted by an update does not exist
    #[error("customer {0} does not exist")]
    CustomerDoesNotExist(Uuid),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or constraint errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
