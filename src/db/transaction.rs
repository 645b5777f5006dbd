//! Transaction helper.
//!
//! Wraps sea-orm's `transaction` so callers get their own error type back
//! instead of `TransactionError<E>`. The closure's future either commits on
//! `Ok` or rolls back on `Err`; nothing is retried.

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// ```rust,ignore
/// let doc = with_transaction(&db, |txn| {
///     Box::pin(async move {
///         let doc = header.insert(txn).await?;
///         document_item::Entity::insert_many(items).exec(txn).await?;
///         Ok::<_, ServiceError>(doc)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + From<DbErr> + Send,
{
    db.transaction::<F, T, E>(f).await.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}
