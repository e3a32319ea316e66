use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{domain::REWARD_COST, ports::database::DatabasePort};
use tower::Service;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::{DomainLogic, Error};

pub struct RedeemRewardRequest {
    /// Barcode scanned at the till
    pub barcode_id: String,
}

impl RedeemRewardRequest {
    pub fn new(barcode_id: impl Into<String>) -> Self {
        Self {
            barcode_id: barcode_id.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RedeemRewardResponse {
    Redeemed {
        customer_id: Uuid,
        old_balance: u32,
        new_balance: u32,
    },
    /// The balance does not cover the reward, nothing was changed
    InsufficientPoints { current: u32, required: u32 },
    CustomerNotFound,
}

impl fmt::Display for RedeemRewardResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedeemRewardResponse::Redeemed { new_balance, .. } => {
                write!(f, "Reward redeemed! New balance: {new_balance}")
            }
            RedeemRewardResponse::InsufficientPoints { current, required } => {
                write!(f, "Not enough points ({current}/{required}).")
            }
            RedeemRewardResponse::CustomerNotFound => f.write_str("Customer not found."),
        }
    }
}

impl<D> Service<RedeemRewardRequest> for DomainLogic<D>
where
    D: DatabasePort + Send + Sync + 'static,
{
    type Response = RedeemRewardResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RedeemRewardRequest) -> Self::Future {
        let database = self.database.clone();
        let span = info_span!("redeem_reward", barcode_id = %req.barcode_id);
        Box::pin(
            async move {
                let Some(customer) = database.get_customer_by_barcode(&req.barcode_id).await?
                else {
                    debug!("no customer registered under barcode");
                    return Ok(RedeemRewardResponse::CustomerNotFound);
                };

                let Some(new_balance) = customer.balance_after_redemption() else {
                    debug!(
                        customer_id = %customer.customer_id,
                        current = customer.loyalty_points,
                        "not enough points for a reward"
                    );
                    return Ok(RedeemRewardResponse::InsufficientPoints {
                        current: customer.loyalty_points,
                        required: REWARD_COST,
                    });
                };

                database
                    .update_customer_balance(customer.customer_id, new_balance)
                    .await?;

                info!(customer_id = %customer.customer_id, new_balance, "reward redeemed");

                Ok(RedeemRewardResponse::Redeemed {
                    customer_id: customer.customer_id,
                    old_balance: customer.loyalty_points,
                    new_balance,
                })
            }
            .instrument(span),
        )
    }
}
