/// Token ledger for AI tool access
///
/// Every balance change happens inside one Postgres transaction together
/// with the `token_transactions` row that records it, so the log and the
/// balance never disagree.
///
/// # Rules
///
/// - A purchase adds `amount > 0` tokens and records a `completed`
///   `purchase` row. Purchases carrying a Stripe PaymentIntent id are
///   applied at most once per intent.
/// - A use of `cost > 0` locks the balance row; when the balance is lower
///   than the cost it fails with "Insufficient tokens" and nothing changes.
/// - Balances never go below zero (also enforced by a `CHECK` constraint).
///
/// # Example
///
/// ```no_run
/// use atelier_shared::ledger::TokenLedger;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = TokenLedger::new(pool);
///
/// ledger.purchase("user-1", 100, Some("pi_123")).await?;
/// let entry = ledger.use_tokens("user-1", Some("upscaler"), 30).await?;
/// assert_eq!(entry.balance, 70);
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::ai_tool::AiTool;
use crate::models::token::{
    TokenTransaction, TransactionKind, TransactionStatus, TRANSACTION_COLUMNS,
};

/// Maximum number of history rows returned at once
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Ledger error
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amounts and costs must be strictly positive
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Balance is lower than the requested debit
    #[error("Insufficient tokens")]
    InsufficientTokens { balance: i64, cost: i64 },

    /// Unknown or inactive AI tool
    #[error("AI tool not found: {0}")]
    ToolNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Balance after a ledger operation, with the row that recorded it
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub balance: i64,
    pub transaction: TokenTransaction,
    /// True when a purchase for the same PaymentIntent was already applied
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

/// Computes the balance left after spending `cost`
///
/// # Errors
///
/// - [`LedgerError::InvalidAmount`] if `cost <= 0`
/// - [`LedgerError::InsufficientTokens`] if `balance < cost`
pub fn debit(balance: i64, cost: i64) -> Result<i64, LedgerError> {
    if cost <= 0 {
        return Err(LedgerError::InvalidAmount(cost));
    }

    if balance < cost {
        return Err(LedgerError::InsufficientTokens { balance, cost });
    }

    Ok(balance - cost)
}

/// Token ledger service
#[derive(Clone)]
pub struct TokenLedger {
    db: PgPool,
}

impl TokenLedger {
    pub fn new(db: PgPool) -> Self {
        TokenLedger { db }
    }

    /// Current balance; 0 for users without a balance row
    pub async fn get_balance(&self, user_id: &str) -> Result<i64, LedgerError> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM tokens WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(balance.unwrap_or(0))
    }

    /// Credits purchased tokens
    ///
    /// When `payment_intent_id` is set:
    /// - an existing `completed` row for the intent makes this a no-op
    ///   (`duplicate = true`)
    /// - an existing `pending` or `failed` row is completed in place
    /// - otherwise a new row is inserted
    pub async fn purchase(
        &self,
        user_id: &str,
        amount: i64,
        payment_intent_id: Option<&str>,
    ) -> Result<LedgerEntry, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut tx = self.db.begin().await?;

        let transaction = match payment_intent_id {
            Some(intent) => {
                let existing = sqlx::query_as::<_, TokenTransaction>(&format!(
                    "SELECT {} FROM token_transactions WHERE payment_intent_id = $1 FOR UPDATE",
                    TRANSACTION_COLUMNS
                ))
                .bind(intent)
                .fetch_optional(&mut *tx)
                .await?;

                match existing {
                    Some(row) if row.status() == Some(TransactionStatus::Completed) => {
                        tx.rollback().await?;
                        tracing::info!(
                            user_id = %user_id,
                            payment_intent_id = %intent,
                            "Purchase already applied"
                        );
                        return Ok(LedgerEntry {
                            balance: self.get_balance(&row.user_id).await?,
                            transaction: row,
                            duplicate: true,
                        });
                    }
                    Some(row) => complete_purchase_row(&mut tx, row, user_id, amount).await?,
                    None => {
                        let inserted = insert_transaction(
                            &mut tx,
                            user_id,
                            amount,
                            TransactionKind::Purchase,
                            None,
                            Some(intent),
                            None,
                        )
                        .await?;

                        match inserted {
                            Some(row) => row,
                            None => {
                                // Lost an insert race against another delivery of the same intent
                                tx.rollback().await?;
                                let row = TokenTransaction::find_by_payment_intent(&self.db, intent)
                                    .await?
                                    .ok_or(LedgerError::Database(sqlx::Error::RowNotFound))?;
                                return Ok(LedgerEntry {
                                    balance: self.get_balance(user_id).await?,
                                    transaction: row,
                                    duplicate: true,
                                });
                            }
                        }
                    }
                }
            }
            None => insert_transaction(
                &mut tx,
                user_id,
                amount,
                TransactionKind::Purchase,
                None,
                None,
                None,
            )
            .await?
            .ok_or(LedgerError::Database(sqlx::Error::RowNotFound))?,
        };

        let balance = credit_balance(&mut tx, user_id, amount).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user_id, amount, balance, "Tokens purchased");

        Ok(LedgerEntry {
            balance,
            transaction,
            duplicate: false,
        })
    }

    /// Spends `cost` tokens
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientTokens`] when the balance is lower than
    /// `cost`; the balance and the log are left untouched.
    pub async fn use_tokens(
        &self,
        user_id: &str,
        tool_id: Option<&str>,
        cost: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        if cost <= 0 {
            return Err(LedgerError::InvalidAmount(cost));
        }

        let mut tx = self.db.begin().await?;

        let current = lock_balance(&mut tx, user_id).await?;
        let balance = debit(current, cost)?;

        sqlx::query("UPDATE tokens SET balance = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .bind(balance)
            .execute(&mut *tx)
            .await?;

        let transaction = insert_transaction(
            &mut tx,
            user_id,
            -cost,
            TransactionKind::Usage,
            tool_id,
            None,
            None,
        )
        .await?
        .ok_or(LedgerError::Database(sqlx::Error::RowNotFound))?;

        tx.commit().await?;

        tracing::debug!(user_id = %user_id, cost, balance, "Tokens used");

        Ok(LedgerEntry {
            balance,
            transaction,
            duplicate: false,
        })
    }

    /// Spends the cost of an active AI tool, looked up by slug
    pub async fn use_tool(
        &self,
        user_id: &str,
        slug: &str,
    ) -> Result<(AiTool, LedgerEntry), LedgerError> {
        let tool = AiTool::find_by_slug(&self.db, slug)
            .await?
            .filter(|tool| tool.active)
            .ok_or_else(|| LedgerError::ToolNotFound(slug.to_string()))?;

        let entry = self
            .use_tokens(user_id, Some(&tool.id.to_string()), tool.token_cost)
            .await?;

        Ok((tool, entry))
    }

    /// Transactions for a user, newest first, at most [`MAX_HISTORY_LIMIT`]
    pub async fn history(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<TokenTransaction>, LedgerError> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        Ok(TokenTransaction::list_for_user(&self.db, user_id, limit).await?)
    }

    /// Admin correction by `delta` tokens (either sign)
    ///
    /// A negative delta larger than the balance fails with
    /// [`LedgerError::InsufficientTokens`].
    pub async fn adjust(
        &self,
        user_id: &str,
        delta: i64,
        reason: Option<&str>,
    ) -> Result<LedgerEntry, LedgerError> {
        if delta == 0 {
            return Err(LedgerError::InvalidAmount(delta));
        }

        let mut tx = self.db.begin().await?;

        let current = lock_balance(&mut tx, user_id).await?;
        if delta < 0 {
            let cost = delta.checked_neg().ok_or(LedgerError::InvalidAmount(delta))?;
            debit(current, cost)?;
        }

        let transaction = insert_transaction(
            &mut tx,
            user_id,
            delta,
            TransactionKind::Adjustment,
            None,
            None,
            reason,
        )
        .await?
        .ok_or(LedgerError::Database(sqlx::Error::RowNotFound))?;

        let balance = if delta < 0 {
            debit_balance(&mut tx, user_id, delta).await?
        } else {
            credit_balance(&mut tx, user_id, delta).await?
        };
        tx.commit().await?;

        tracing::info!(user_id = %user_id, delta, balance, reason = ?reason, "Token balance adjusted");

        Ok(LedgerEntry {
            balance,
            transaction,
            duplicate: false,
        })
    }

    /// Marks the pending purchase for a PaymentIntent as failed
    pub async fn mark_failed(&self, payment_intent_id: &str) -> Result<bool, LedgerError> {
        let updated = TokenTransaction::set_status_by_payment_intent(
            &self.db,
            payment_intent_id,
            TransactionStatus::Failed,
        )
        .await?;

        if updated {
            tracing::info!(payment_intent_id = %payment_intent_id, "Purchase marked failed");
        }

        Ok(updated)
    }
}

/// Reads the balance with a row lock; 0 when the user has no row yet
async fn lock_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
) -> Result<i64, sqlx::Error> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT balance FROM tokens WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(balance.unwrap_or(0))
}

/// Adds `delta` to the balance, creating the row if needed
async fn credit_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    delta: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO tokens (user_id, balance)
        VALUES ($1, $2)
        ON CONFLICT (user_id)
        DO UPDATE SET balance = tokens.balance + EXCLUDED.balance, updated_at = NOW()
        RETURNING balance
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .fetch_one(&mut **tx)
    .await
}

/// Applies a negative `delta` to a row already locked by [`lock_balance`]
///
/// Never inserts: a candidate row with a negative balance fails the
/// `balance >= 0` check before any conflict is resolved.
async fn debit_balance(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    delta: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE tokens
        SET balance = balance + $2, updated_at = NOW()
        WHERE user_id = $1
        RETURNING balance
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .fetch_one(&mut **tx)
    .await
}

/// Inserts a completed transaction row
///
/// Returns `None` when a row for the same PaymentIntent already exists.
async fn insert_transaction(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    amount: i64,
    kind: TransactionKind,
    tool_id: Option<&str>,
    payment_intent_id: Option<&str>,
    note: Option<&str>,
) -> Result<Option<TokenTransaction>, sqlx::Error> {
    let query = format!(
        r#"
        INSERT INTO token_transactions
            (user_id, amount, kind, tool_id, payment_intent_id, note, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'completed')
        ON CONFLICT (payment_intent_id) WHERE payment_intent_id IS NOT NULL DO NOTHING
        RETURNING {}
        "#,
        TRANSACTION_COLUMNS
    );

    sqlx::query_as::<_, TokenTransaction>(&query)
        .bind(user_id)
        .bind(amount)
        .bind(kind.as_str())
        .bind(tool_id)
        .bind(payment_intent_id)
        .bind(note)
        .fetch_optional(&mut **tx)
        .await
}

/// Completes a pending/failed purchase row for the confirmed amount
async fn complete_purchase_row(
    tx: &mut Transaction<'_, Postgres>,
    row: TokenTransaction,
    user_id: &str,
    amount: i64,
) -> Result<TokenTransaction, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE token_transactions
        SET status = 'completed', amount = $2, user_id = $3
        WHERE id = $1
        RETURNING {}
        "#,
        TRANSACTION_COLUMNS
    );

    sqlx::query_as::<_, TokenTransaction>(&query)
        .bind(row.id)
        .bind(amount)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_leaves_remainder() {
        assert_eq!(debit(100, 30).unwrap(), 70);
        assert_eq!(debit(30, 30).unwrap(), 0);
    }

    #[test]
    fn test_debit_insufficient() {
        let err = debit(10, 11).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientTokens {
                balance: 10,
                cost: 11
            }
        ));
        assert_eq!(err.to_string(), "Insufficient tokens");
    }

    #[test]
    fn test_debit_rejects_non_positive_cost() {
        assert!(matches!(debit(10, 0), Err(LedgerError::InvalidAmount(0))));
        assert!(matches!(debit(10, -5), Err(LedgerError::InvalidAmount(-5))));
    }
}
