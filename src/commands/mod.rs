use std::{borrow::Cow, sync::Arc};

pub mod award_points;
pub mod redeem_reward;

/// Loyalty ledger operations over a customer store
///
/// Each operation reads a customer, computes the new balance and writes it back. These steps
/// are not atomic: concurrent calls for the same customer can overwrite each other's update, so
/// callers must serialize access per customer.
pub struct DomainLogic<D> {
    database: Arc<D>,
}

impl<D> DomainLogic<D> {
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }
}

impl<D> Clone for DomainLogic<D> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database port error: {0:?}")]
    Database(#[from] crate::ports::database::Error),

    /// The purchase amount is negative, not a finite number, or worth more points than a
    /// balance can hold
    #[error("invalid purchase amount: {0}")]
    InvalidAmount(f64),

    #[error("invalid state: {0}")]
    InvalidState(Cow<'static, str>),
}
