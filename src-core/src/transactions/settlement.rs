//! Applies the financial effect of an approved transaction to the offering
//! and holding rows. Every entry point runs on a connection that is already
//! inside a database transaction, so a returned error rolls everything back.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::holdings::HoldingDB;
use crate::offerings::OfferingDB;
use crate::schema::{holdings, offerings, transactions};

use super::transactions_errors::{Result, TransactionError};
use super::transactions_model::{Transaction, TransactionDB, TransactionSide};

#[derive(Debug)]
pub enum SettlementOutcome {
    /// The transaction was claimed and its effects were applied.
    Settled(Transaction),
    /// The transaction was no longer pending; nothing was changed.
    AlreadySettled,
}

/// Settles one transaction: claims the pending row, then moves shares
/// between the offering and the buyer's or seller's holding.
///
/// The claim is an `UPDATE ... WHERE status = 'pending'`, so settling the
/// same transaction twice is a no-op on the second attempt regardless of
/// whether it arrives via admin approval or a gateway callback.
pub fn settle(conn: &mut SqliteConnection, transaction_id: &str) -> Result<SettlementOutcome> {
    let record = transactions::table
        .find(transaction_id)
        .first::<TransactionDB>(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => TransactionError::NotFound(format!(
                "Transaction with id {} not found",
                transaction_id
            )),
            _ => TransactionError::DatabaseError(e.to_string()),
        })?;

    let now = chrono::Utc::now().naive_utc();
    let claimed = diesel::update(
        transactions::table
            .find(transaction_id)
            .filter(transactions::status.eq("pending")),
    )
    .set((
        transactions::status.eq("approved"),
        transactions::updated_at.eq(now),
    ))
    .execute(conn)
    .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

    if claimed == 0 {
        return Ok(SettlementOutcome::AlreadySettled);
    }

    let mut transaction: Transaction = record.try_into()?;
    transaction.status = super::transactions_model::TransactionStatus::Approved;
    transaction.updated_at = now;

    match transaction.side {
        TransactionSide::Buy => apply_buy(conn, &transaction, now)?,
        TransactionSide::Sell => apply_sell(conn, &transaction, now)?,
    }

    Ok(SettlementOutcome::Settled(transaction))
}

fn apply_buy(conn: &mut SqliteConnection, tx: &Transaction, now: NaiveDateTime) -> Result<()> {
    let offering = offerings::table
        .find(&tx.offering_id)
        .first::<OfferingDB>(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                TransactionError::NotFound(format!("Offering with id {} not found", tx.offering_id))
            }
            _ => TransactionError::DatabaseError(e.to_string()),
        })?;

    if offering.available_shares < tx.shares_count {
        return Err(TransactionError::InsufficientSupply {
            available: offering.available_shares,
            requested: tx.shares_count,
        });
    }

    diesel::update(offerings::table.find(&tx.offering_id))
        .set(offerings::available_shares.eq(offering.available_shares - tx.shares_count))
        .execute(conn)
        .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

    let existing = holdings::table
        .filter(holdings::user_id.eq(&tx.user_id))
        .filter(holdings::offering_id.eq(&tx.offering_id))
        .first::<HoldingDB>(conn)
        .optional()
        .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

    match existing {
        Some(holding) => {
            let new_average = weighted_average(
                holding.shares_owned,
                holding.average_price,
                tx.shares_count,
                tx.price,
            )?;
            diesel::update(holdings::table.find(&holding.id))
                .set((
                    holdings::shares_owned.eq(holding.shares_owned + tx.shares_count),
                    holdings::average_price.eq(new_average),
                    holdings::updated_at.eq(now),
                ))
                .execute(conn)
                .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;
        }
        None => {
            let holding = HoldingDB {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: tx.user_id.clone(),
                offering_id: tx.offering_id.clone(),
                shares_owned: tx.shares_count,
                average_price: tx.price,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(holdings::table)
                .values(&holding)
                .execute(conn)
                .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;
        }
    }

    Ok(())
}

fn apply_sell(conn: &mut SqliteConnection, tx: &Transaction, now: NaiveDateTime) -> Result<()> {
    let holding = holdings::table
        .filter(holdings::user_id.eq(&tx.user_id))
        .filter(holdings::offering_id.eq(&tx.offering_id))
        .first::<HoldingDB>(conn)
        .optional()
        .map_err(|e| TransactionError::DatabaseError(e.to_string()))?
        .ok_or(TransactionError::InsufficientHoldings {
            owned: 0,
            requested: tx.shares_count,
        })?;

    if holding.shares_owned < tx.shares_count {
        return Err(TransactionError::InsufficientHoldings {
            owned: holding.shares_owned,
            requested: tx.shares_count,
        });
    }

    let remaining = holding.shares_owned - tx.shares_count;
    if remaining == 0 {
        diesel::delete(holdings::table.find(&holding.id))
            .execute(conn)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;
    } else {
        // Average price is a cost basis; selling does not move it.
        diesel::update(holdings::table.find(&holding.id))
            .set((
                holdings::shares_owned.eq(remaining),
                holdings::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;
    }

    let offering = offerings::table
        .find(&tx.offering_id)
        .first::<OfferingDB>(conn)
        .map_err(|e| match e {
            diesel::result::Error::NotFound => {
                TransactionError::NotFound(format!("Offering with id {} not found", tx.offering_id))
            }
            _ => TransactionError::DatabaseError(e.to_string()),
        })?;

    diesel::update(offerings::table.find(&tx.offering_id))
        .set(offerings::available_shares.eq(offering.available_shares + tx.shares_count))
        .execute(conn)
        .map_err(|e| TransactionError::DatabaseError(e.to_string()))?;

    Ok(())
}

/// Volume-weighted average cost across the existing position and the new
/// lot, computed in fixed-point to avoid drift on repeated buys.
pub fn weighted_average(
    old_shares: i64,
    old_average: f64,
    new_shares: i64,
    new_price: f64,
) -> Result<f64> {
    let old_shares_d = Decimal::from(old_shares);
    let new_shares_d = Decimal::from(new_shares);
    let old_average_d = Decimal::from_f64_retain(old_average)
        .ok_or_else(|| TransactionError::InvalidData("Average price is not a number".to_string()))?;
    let new_price_d = Decimal::from_f64_retain(new_price)
        .ok_or_else(|| TransactionError::InvalidData("Price is not a number".to_string()))?;

    let total_shares = old_shares_d + new_shares_d;
    if total_shares.is_zero() {
        return Err(TransactionError::InvalidData(
            "Cannot average over zero shares".to_string(),
        ));
    }

    let average = (old_shares_d * old_average_d + new_shares_d * new_price_d) / total_shares;
    average.to_f64().ok_or_else(|| {
        TransactionError::InvalidData("Average price out of representable range".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_blends_lots_by_volume() {
        // 40 @ 10 then 10 @ 20 averages to 12 exactly
        let avg = weighted_average(40, 10.0, 10, 20.0).unwrap();
        assert_eq!(avg, 12.0);
    }

    #[test]
    fn weighted_average_of_first_lot_is_its_price() {
        let avg = weighted_average(0, 0.0, 25, 7.5).unwrap();
        assert_eq!(avg, 7.5);
    }

    #[test]
    fn weighted_average_rejects_zero_total() {
        assert!(weighted_average(0, 0.0, 0, 10.0).is_err());
    }
}
