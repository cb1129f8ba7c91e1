/// CouchDB backend over its HTTP API.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

#[cfg(any(feature = "couch-store", feature = "mongo-store"))]
use crate::dao::storage::{StorageError, StoreOp};
use crate::dao::storage::StorageResult;

pub use memory::MemoryKvStore;

/// Narrow port over the shared key-value store holding the party state.
///
/// Every operation is atomic for a single key only; the store offers no
/// multi-key transactions and no compare-and-swap.
pub trait KvStore: Send + Sync {
    /// Short backend identifier reported by the health endpoint.
    fn backend(&self) -> &'static str;
    /// Read the raw value under `key`, `None` when absent.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Overwrite `key` with `value`.
    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove `key`. Deleting an absent key succeeds.
    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Run a backend call for `key` as a `'static` future, tagging failures with the operation.
#[cfg(any(feature = "couch-store", feature = "mongo-store"))]
pub(crate) fn keyed_op<S, T, E, F, Fut>(
    store: &S,
    op: StoreOp,
    key: &str,
    call: F,
) -> BoxFuture<'static, StorageResult<T>>
where
    S: Clone + Send + 'static,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
    F: FnOnce(S, String) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
    let store = store.clone();
    let key = key.to_owned();
    Box::pin(async move {
        call(store, key.clone())
            .await
            .map_err(|err| StorageError::operation(op, key, err))
    })
}
