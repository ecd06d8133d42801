/// Token balances and the transaction log
///
/// `tokens` holds one balance row per user; `token_transactions` is the
/// append-mostly log of credits and debits. Balance changes that must stay
/// consistent with the log go through [`crate::ledger`], which wraps both in
/// one database transaction. This module only reads and records.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id VARCHAR(255) NOT NULL UNIQUE,
///     balance BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE token_transactions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id VARCHAR(255) NOT NULL,
///     amount BIGINT NOT NULL,
///     kind VARCHAR(16) NOT NULL,
///     tool_id VARCHAR(255),
///     payment_intent_id VARCHAR(255),
///     note VARCHAR(255),
///     status VARCHAR(16) NOT NULL DEFAULT 'completed',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Tokens bought through Stripe (positive amount)
    Purchase,
    /// Tokens spent on an AI tool (negative amount)
    Usage,
    /// Manual correction by an admin (either sign)
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "purchase",
            TransactionKind::Usage => "usage",
            TransactionKind::Adjustment => "adjustment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(TransactionKind::Purchase),
            "usage" => Some(TransactionKind::Usage),
            "adjustment" => Some(TransactionKind::Adjustment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub amount: i64,
    pub kind: String,
    pub tool_id: Option<String>,
    pub payment_intent_id: Option<String>,
    /// Free-text reason, set on admin adjustments
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Input for [`TokenTransaction::create`]
#[derive(Debug, Clone)]
pub struct CreateTokenTransaction {
    pub user_id: String,
    pub amount: i64,
    pub kind: TransactionKind,
    pub tool_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub note: Option<String>,
    pub status: TransactionStatus,
}

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, kind, tool_id, payment_intent_id, note, status, created_at";

impl TokenTransaction {
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::from_str(&self.kind)
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        TransactionStatus::from_str(&self.status)
    }

    /// Records a transaction without touching the balance
    ///
    /// Used for `pending` purchase rows created alongside a Stripe
    /// PaymentIntent; the balance only moves once the payment succeeds.
    pub async fn create(
        pool: &PgPool,
        data: CreateTokenTransaction,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO token_transactions
                (user_id, amount, kind, tool_id, payment_intent_id, note, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        );

        sqlx::query_as::<_, TokenTransaction>(&query)
            .bind(data.user_id)
            .bind(data.amount)
            .bind(data.kind.as_str())
            .bind(data.tool_id)
            .bind(data.payment_intent_id)
            .bind(data.note)
            .bind(data.status.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM token_transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        );

        sqlx::query_as::<_, TokenTransaction>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM token_transactions WHERE payment_intent_id = $1",
            TRANSACTION_COLUMNS
        );

        sqlx::query_as::<_, TokenTransaction>(&query)
            .bind(payment_intent_id)
            .fetch_optional(pool)
            .await
    }

    /// A user's transactions, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM token_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            TRANSACTION_COLUMNS
        );

        sqlx::query_as::<_, TokenTransaction>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Moves a pending transaction to a final status
    ///
    /// Returns `false` when no pending row exists for the intent.
    pub async fn set_status_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
        status: TransactionStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE token_transactions
            SET status = $2
            WHERE payment_intent_id = $1 AND status = 'pending'
            "#,
        )
        .bind(payment_intent_id)
        .bind(status.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            TransactionKind::Purchase,
            TransactionKind::Usage,
            TransactionKind::Adjustment,
        ] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("refund"), None);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            TransactionStatus::from_str("pending"),
            Some(TransactionStatus::Pending)
        );
        assert_eq!(TransactionStatus::from_str("PENDING"), None);
    }
}
