use crate::{
    domain::{Customer, LoyaltyTransaction},
    ports::database::{DatabasePort, Error},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    /// Barcode to customer ID index
    barcodes: HashMap<String, Uuid>,
    transactions: Vec<LoyaltyTransaction>,
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDatabase {
    /// Add a customer to the store
    ///
    /// Registration is handled outside of the ledger, so this is only used to seed the store.
    /// A customer registered under a barcode that is already taken replaces the previous one.
    /// Registering a known customer again moves them to the new barcode.
    pub fn register_customer(&self, customer: Customer) -> Result<(), Error> {
        let mut tables = self.tables.lock()?;
        let old_barcode = tables
            .customers
            .get(&customer.customer_id)
            .map(|existing| existing.barcode_id.clone());
        if let Some(old_barcode) = old_barcode {
            tables.barcodes.remove(&old_barcode);
        }
        if let Some(previous) = tables
            .barcodes
            .insert(customer.barcode_id.clone(), customer.customer_id)
        {
            tables.customers.remove(&previous);
        }
        tables.customers.insert(customer.customer_id, customer);
        Ok(())
    }

    /// Snapshot of the transaction log, in insertion order
    pub fn transactions(&self) -> Result<Vec<LoyaltyTransaction>, Error> {
        Ok(self.tables.lock()?.transactions.clone())
    }
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn get_customer_by_barcode(&self, barcode_id: &str) -> Result<Option<Customer>, Error> {
        let tables = self.tables.lock()?;
        let customer = tables
            .barcodes
            .get(barcode_id)
            .and_then(|customer_id| tables.customers.get(customer_id))
            .cloned();

        Ok(customer)
    }

    async fn insert_transaction(&self, transaction: LoyaltyTransaction) -> Result<(), Error> {
        let mut tables = self.tables.lock()?;
        // Mirror the foreign key on the transaction log
        if !tables.customers.contains_key(&transaction.customer_id) {
            return Err(Error::CustomerDoesNotExist(transaction.customer_id));
        }
        tables.transactions.push(transaction);

        Ok(())
    }

    async fn update_customer_balance(
        &self,
        customer_id: Uuid,
        new_balance: u32,
    ) -> Result<(), Error> {
        let mut tables = self.tables.lock()?;
        let customer = tables
            .customers
            .get_mut(&customer_id)
            .ok_or(Error::CustomerDoesNotExist(customer_id))?;
        customer.loyalty_points = new_balance;
        customer.current_points_cache = new_balance;

        Ok(())
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[tokio::test]
    async fn test_register_retrieve() {
        let database = MemoryDatabase::default();
        let customer = Customer::new(Uuid::new_v4(), "4006381333931", 120);
        database.register_customer(customer.clone()).unwrap();

        let res = database.get_customer_by_barcode("4006381333931").await;
        assert_that!(res).is_ok().is_equal_to(Some(customer));
    }

    #[tokio::test]
    async fn test_unknown_barcode() {
        let database = MemoryDatabase::default();
        database
            .register_customer(Customer::new(Uuid::new_v4(), "4006381333931", 0))
            .unwrap();

        let res = database.get_customer_by_barcode("0000000000000").await;
        assert_that!(res).is_ok().is_none();
    }

    #[tokio::test]
    async fn test_reregister_barcode_replaces_customer() {
        let database = MemoryDatabase::default();
        let first = Customer::new(Uuid::new_v4(), "0001", 10);
        let second = Customer::new(Uuid::new_v4(), "0001", 20);
        database.register_customer(first.clone()).unwrap();
        database.register_customer(second.clone()).unwrap();

        let res = database.get_customer_by_barcode("0001").await;
        assert_that!(res).is_ok().is_equal_to(Some(second));
        // The replaced customer can no longer be updated
        let res = database.update_customer_balance(first.customer_id, 5).await;
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::CustomerDoesNotExist(id) if *id == first.customer_id));
    }

    #[tokio::test]
    async fn test_reregister_customer_moves_barcode() {
        let database = MemoryDatabase::default();
        let customer_id = Uuid::new_v4();
        database
            .register_customer(Customer::new(customer_id, "0001", 10))
            .unwrap();
        database
            .register_customer(Customer::new(customer_id, "0002", 10))
            .unwrap();

        let res = database.get_customer_by_barcode("0001").await;
        assert_that!(res).is_ok().is_none();
        let res = database.get_customer_by_barcode("0002").await;
        assert_that!(res)
            .is_ok()
            .is_equal_to(Some(Customer::new(customer_id, "0002", 10)));
    }

    #[tokio::test]
    async fn test_update_balance_sets_cache() {
        let database = MemoryDatabase::default();
        let customer = Customer::new(Uuid::new_v4(), "0001", 0);
        database.register_customer(customer.clone()).unwrap();

        let res = database
            .update_customer_balance(customer.customer_id, 730)
            .await;
        assert_that!(res).is_ok();

        let stored = database
            .get_customer_by_barcode("0001")
            .await
            .unwrap()
            .unwrap();
        assert_that!(stored.loyalty_points).is_equal_to(730);
        assert_that!(stored.current_points_cache).is_equal_to(730);
    }

    #[tokio::test]
    async fn test_update_unknown_customer() {
        let database = MemoryDatabase::default();
        let res = database.update_customer_balance(Uuid::new_v4(), 10).await;
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::CustomerDoesNotExist(_)));
    }

    #[tokio::test]
    async fn test_transactions_append_only() {
        let database = MemoryDatabase::default();
        let customer = Customer::new(Uuid::new_v4(), "0001", 0);
        database.register_customer(customer.clone()).unwrap();

        let first = LoyaltyTransaction::new(customer.customer_id, 1.0, 10);
        let second = LoyaltyTransaction::new(customer.customer_id, 2.5, 25);
        database.insert_transaction(first.clone()).await.unwrap();
        database.insert_transaction(second.clone()).await.unwrap();

        let res = database.transactions();
        assert_that!(res).is_ok().is_equal_to(vec![first, second]);
    }

    #[tokio::test]
    async fn test_transaction_for_unknown_customer() {
        let database = MemoryDatabase::default();
        let res = database
            .insert_transaction(LoyaltyTransaction::new(Uuid::new_v4(), 1.0, 10))
            .await;
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::CustomerDoesNotExist(_)));
        assert_that!(database.transactions().unwrap()).is_empty();
    }
}
