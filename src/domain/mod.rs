use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Points earned per whole unit of currency spent
pub const POINTS_PER_CURRENCY_UNIT: u32 = 10;

/// Fixed cost of a reward, in loyalty points
pub const REWARD_COST: u32 = 500;

/// Largest balance the customer store can hold
///
/// Balances and earned points are stored in signed 32-bit columns.
pub const MAX_BALANCE: u32 = i32::MAX as u32;

/// Customer enrolled in the loyalty program
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    /// Unique identifier assigned by the store
    pub customer_id: Uuid,
    /// Scannable identifier printed on the loyalty card
    ///
    /// This is the key used to look up customers at the till.
    pub barcode_id: String,
    /// Number of accrued loyalty points
    pub loyalty_points: u32,
    /// Denormalized copy of `loyalty_points`
    ///
    /// Both fields are always written together.
    pub current_points_cache: u32,
}

impl Customer {
    pub fn new(customer_id: Uuid, barcode_id: impl Into<String>, loyalty_points: u32) -> Self {
        Self {
            customer_id,
            barcode_id: barcode_id.into(),
            loyalty_points,
            current_points_cache: loyalty_points,
        }
    }

    /// Balance after adding `points`, or `None` if it would exceed [`MAX_BALANCE`]
    pub fn balance_after_award(&self, points: u32) -> Option<u32> {
        self.loyalty_points
            .checked_add(points)
            .filter(|balance| *balance <= MAX_BALANCE)
    }

    /// Balance after claiming one reward, or `None` if the customer cannot afford it
    pub fn balance_after_redemption(&self) -> Option<u32> {
        self.loyalty_points.checked_sub(REWARD_COST)
    }
}

/// Points earned for a purchase
///
/// Fractions of a point are truncated. Returns `None` for negative or non-finite amounts, and for
/// amounts worth more than [`MAX_BALANCE`] points.
pub fn points_for_purchase(amount_spent: f64) -> Option<u32> {
    let points = (amount_spent * POINTS_PER_CURRENCY_UNIT as f64).trunc();
    if !points.is_finite() || amount_spent < 0.0 || points > MAX_BALANCE as f64 {
        return None;
    }

    Some(points as u32)
}

/// Point-earning event appended to the transaction log
#[derive(Clone, Debug, PartialEq)]
pub struct LoyaltyTransaction {
    pub transaction_id: Uuid,
    pub customer_id: Uuid,
    /// Amount spent on the purchase, in currency units
    pub amount_spent: f64,
    pub points_earned: u32,
    pub created_at: DateTime<Utc>,
}

impl LoyaltyTransaction {
    pub fn new(customer_id: Uuid, amount_spent: f64, points_earned: u32) -> Self {
        Self {
            transaction_id: Uuid::new_v4(),
            customer_id,
            amount_spent,
            points_earned,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use speculoos::prelude::*;

    #[rstest]
    #[case(0.0, 0)]
    #[case(0.05, 0)]
    #[case(1.0, 10)]
    #[case(3.65, 36)]
    #[case(12.50, 125)]
    #[case(99.99, 999)]
    fn test_points_for_purchase(#[case] amount_spent: f64, #[case] expected: u32) {
        assert_that!(points_for_purchase(amount_spent)).is_equal_to(Some(expected));
    }

    #[rstest]
    #[case(-0.5)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(1.0e9)]
    #[case(214_748_365.0)]
    fn test_points_for_purchase_rejected(#[case] amount_spent: f64) {
        assert_that!(points_for_purchase(amount_spent)).is_none();
    }

    #[test]
    fn test_points_for_purchase_upper_bound() {
        assert_that!(points_for_purchase(214_748_364.0)).is_equal_to(Some(2_147_483_640));
    }

    #[test]
    fn test_new_customer_cache_matches_balance() {
        let customer = Customer::new(Uuid::new_v4(), "0001", 42);
        assert_that!(customer.current_points_cache).is_equal_to(customer.loyalty_points);
    }

    #[rstest]
    #[case(0, None)]
    #[case(499, None)]
    #[case(500, Some(0))]
    #[case(1250, Some(750))]
    fn test_balance_after_redemption(#[case] balance: u32, #[case] expected: Option<u32>) {
        let customer = Customer::new(Uuid::new_v4(), "0001", balance);
        assert_that!(customer.balance_after_redemption()).is_equal_to(expected);
    }

    #[test]
    fn test_balance_after_award_overflow() {
        let customer = Customer::new(Uuid::new_v4(), "0001", MAX_BALANCE - 5);
        assert_that!(customer.balance_after_award(5)).is_equal_to(Some(MAX_BALANCE));
        assert_that!(customer.balance_after_award(6)).is_none();
        assert_that!(customer.balance_after_award(u32::MAX)).is_none();
    }
}
