//! Transaction helper that keeps the caller's `ServiceError` intact.

use crate::errors::ServiceError;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Runs `f` inside a transaction: commit on `Ok`, rollback on `Err`.
///
/// Work inside the closure must go through the supplied transaction handle,
/// never through the pool.
///
/// ```rust,ignore
/// with_transaction(&db, |txn| {
///     Box::pin(async move {
///         let a = slide::Entity::find_by_id(a_id).one(txn).await?;
///         // ...
///         Ok(a)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    db.transaction::<F, T, ServiceError>(f)
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            TransactionError::Transaction(err) => err,
        })
}
