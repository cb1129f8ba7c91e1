use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::dao::{
    kv_store::{KvStore, keyed_op},
    storage::{StorageResult, StoreOp},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchValueDocument, doc_id},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_PUT_ATTEMPTS: u32 = 3;

/// CouchDB-backed store keeping one document per key.
#[derive(Clone)]
pub struct CouchKvStore {
    client: Client,
    config: Arc<CouchConfig>,
}

impl CouchKvStore {
    /// Build the HTTP client and create the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(CouchDaoError::Client)?;
        let store = Self {
            client,
            config: Arc::new(config),
        };
        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    fn document_url(&self, key: &str) -> String {
        format!("{}/{}", self.config.database_url(), doc_id(key))
    }

    async fn send(&self, builder: RequestBuilder, target: &str) -> CouchResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                target: target.to_owned(),
                source,
            })
    }

    fn unexpected(target: &str, status: StatusCode) -> CouchDaoError {
        CouchDaoError::Status {
            target: target.to_owned(),
            status,
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.config.database.as_str();
        let url = self.config.database_url();

        let existing = self
            .send(self.request(Method::GET, url.clone()), database)
            .await?;
        match existing.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self.send(self.request(Method::PUT, url), database).await?;
                match created.status() {
                    // 412: another instance created it first.
                    status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => {
                        Ok(())
                    }
                    status => Err(Self::unexpected(database, status)),
                }
            }
            status => Err(Self::unexpected(database, status)),
        }
    }

    async fn fetch(&self, key: &str) -> CouchResult<Option<CouchValueDocument>> {
        let response = self
            .send(self.request(Method::GET, self.document_url(key)), key)
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response
                    .json()
                    .await
                    .map(Some)
                    .map_err(|source| CouchDaoError::Malformed {
                        target: key.to_owned(),
                        source,
                    })
            }
            status => Err(Self::unexpected(key, status)),
        }
    }

    async fn revision(&self, key: &str) -> CouchResult<Option<String>> {
        Ok(self.fetch(key).await?.and_then(|doc| doc.rev))
    }

    /// Overwrite `key`, refreshing the revision when a concurrent writer moved it.
    async fn store(&self, key: &str, value: String) -> CouchResult<()> {
        let mut rev = self.revision(key).await?;
        for attempt in 1..=MAX_PUT_ATTEMPTS {
            let document = CouchValueDocument::new(key, value.clone(), rev.take());
            let response = self
                .send(
                    self.request(Method::PUT, self.document_url(key))
                        .json(&document),
                    key,
                )
                .await?;
            match response.status() {
                status if status.is_success() => return Ok(()),
                StatusCode::CONFLICT => {
                    debug!(key, attempt, "CouchDB revision moved; retrying put");
                    rev = self.revision(key).await?;
                }
                status => return Err(Self::unexpected(key, status)),
            }
        }
        Err(CouchDaoError::RevisionConflict {
            target: key.to_owned(),
            attempts: MAX_PUT_ATTEMPTS,
        })
    }

    async fn remove(&self, key: &str) -> CouchResult<()> {
        let Some(rev) = self.revision(key).await? else {
            return Ok(());
        };
        let response = self
            .send(
                self.request(Method::DELETE, self.document_url(key))
                    .query(&[("rev", rev)]),
                key,
            )
            .await?;
        match response.status() {
            status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
            status => Err(Self::unexpected(key, status)),
        }
    }

    async fn ping(&self) -> CouchResult<()> {
        let url = format!("{}/_up", self.config.base_url);
        let response = self.send(self.request(Method::GET, url), "_up").await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::unexpected("_up", response.status()))
        }
    }
}

impl KvStore for CouchKvStore {
    fn backend(&self) -> &'static str {
        "couchdb"
    }

    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        keyed_op(self, StoreOp::Get, key, |store, key| async move {
            Ok::<_, CouchDaoError>(store.fetch(&key).await?.map(|doc| doc.value))
        })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        keyed_op(self, StoreOp::Put, key, |store, key| async move {
            store.store(&key, value).await
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        keyed_op(self, StoreOp::Delete, key, |store, key| async move {
            store.remove(&key).await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
