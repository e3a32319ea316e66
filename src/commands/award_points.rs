use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::{points_for_purchase, LoyaltyTransaction},
    ports::database::DatabasePort,
};
use tower::Service;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::{DomainLogic, Error};

pub struct AwardPointsRequest {
    /// Barcode scanned at the till
    pub barcode_id: String,
    /// Amount spent on the purchase, in currency units
    pub amount_spent: f64,
}

impl AwardPointsRequest {
    pub fn new(barcode_id: impl Into<String>, amount_spent: f64) -> Self {
        Self {
            barcode_id: barcode_id.into(),
            amount_spent,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AwardPointsResponse {
    Awarded {
        customer_id: Uuid,
        points_earned: u32,
        /// Previous number of loyalty points
        old_balance: u32,
        /// New number of loyalty points
        new_balance: u32,
    },
    /// No customer is registered under the barcode
    CustomerNotFound,
}

impl fmt::Display for AwardPointsResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwardPointsResponse::Awarded { new_balance, .. } => {
                write!(f, "Points added! New balance: {new_balance}")
            }
            AwardPointsResponse::CustomerNotFound => {
                f.write_str("Customer not found. Would you like to register them?")
            }
        }
    }
}

impl<D> Service<AwardPointsRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = AwardPointsResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AwardPointsRequest) -> Self::Future {
        let database = self.database.clone();
        let span = info_span!(
            "award_points",
            barcode_id = %req.barcode_id,
            amount_spent = req.amount_spent
        );
        Box::pin(
            async move {
                let points_earned = points_for_purchase(req.amount_spent)
                    .ok_or(Error::InvalidAmount(req.amount_spent))?;

                let Some(customer) = database.get_customer_by_barcode(&req.barcode_id).await?
                else {
                    debug!("no customer registered under barcode");
                    return Ok(AwardPointsResponse::CustomerNotFound);
                };

                let new_balance = customer.balance_after_award(points_earned).ok_or_else(|| {
                    Error::InvalidState(
                        format!(
                            "adding {points_earned} points to {} overflows the balance",
                            customer.loyalty_points
                        )
                        .into(),
                    )
                })?;

                // Log first, then update the balance
                database
                    .insert_transaction(LoyaltyTransaction::new(
                        customer.customer_id,
                        req.amount_spent,
                        points_earned,
                    ))
                    .await?;
                database
                    .update_customer_balance(customer.customer_id, new_balance)
                    .await?;

                info!(
                    customer_id = %customer.customer_id,
                    points_earned,
                    new_balance,
                    "points awarded"
                );

                Ok(AwardPointsResponse::Awarded {
                    customer_id: customer.customer_id,
                    points_earned,
                    old_balance: customer.loyalty_points,
                    new_balance,
                })
            }
            .instrument(span),
        )
    }
}
