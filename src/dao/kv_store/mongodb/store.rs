use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use mongodb::{Client, Collection, bson::doc, options::ClientOptions};
use tokio::{sync::RwLock, time::sleep};
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
    models::{KV_COLLECTION, MongoValueDocument, key_filter},
};
use crate::dao::{
    kv_store::{KvStore, keyed_op},
    storage::{StorageResult, StoreOp},
};

const PING_ATTEMPTS: u32 = 5;
const PING_INITIAL_DELAY: Duration = Duration::from_millis(250);
const PING_MAX_DELAY: Duration = Duration::from_secs(5);

/// MongoDB-backed store keeping one document per key in the `kv` collection.
#[derive(Clone)]
pub struct MongoKvStore {
    config: Arc<MongoConfig>,
    // Swapped wholesale on reconnect; the client owns the connection pool.
    client: Arc<RwLock<Client>>,
}

impl MongoKvStore {
    /// Connect and wait until the server answers a ping.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let client = open_client(&config).await?;
        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(RwLock::new(client)),
        })
    }

    async fn entries(&self) -> Collection<MongoValueDocument> {
        self.client
            .read()
            .await
            .database(&self.config.database)
            .collection(KV_COLLECTION)
    }

    async fn read(&self, key: &str) -> MongoResult<Option<String>> {
        let document = self
            .entries()
            .await
            .find_one(key_filter(key))
            .await
            .map_err(MongoDaoError::Command)?;
        Ok(document.map(|doc| doc.value))
    }

    async fn upsert(&self, key: &str, value: String) -> MongoResult<()> {
        let document = MongoValueDocument {
            key: key.to_owned(),
            value,
        };
        self.entries()
            .await
            .replace_one(key_filter(key), &document)
            .upsert(true)
            .await
            .map_err(MongoDaoError::Command)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> MongoResult<()> {
        self.entries()
            .await
            .delete_one(key_filter(key))
            .await
            .map_err(MongoDaoError::Command)?;
        Ok(())
    }

    async fn ping(&self) -> MongoResult<()> {
        let client = self.client.read().await.clone();
        client
            .database(&self.config.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::Unreachable {
                attempts: 1,
                source,
            })?;
        Ok(())
    }

    async fn reopen(&self) -> MongoResult<()> {
        let client = open_client(&self.config).await?;
        *self.client.write().await = client;
        Ok(())
    }
}

async fn open_client(config: &MongoConfig) -> MongoResult<Client> {
    let client_error = |source| MongoDaoError::Client {
        uri: config.uri.clone(),
        source,
    };
    let options = ClientOptions::parse(&config.uri)
        .await
        .map_err(client_error)?;
    let client = Client::with_options(options).map_err(client_error)?;

    let database = client.database(&config.database);
    let mut delay = PING_INITIAL_DELAY;
    let mut attempts = 0;
    loop {
        attempts += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok(client),
            Err(source) if attempts >= PING_ATTEMPTS => {
                return Err(MongoDaoError::Unreachable { attempts, source });
            }
            Err(err) => {
                debug!(attempts, error = %err, "MongoDB ping failed; retrying");
                sleep(delay).await;
                delay = (delay * 2).min(PING_MAX_DELAY);
            }
        }
    }
}

impl KvStore for MongoKvStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        keyed_op(self, StoreOp::Get, key, |store, key| async move {
            store.read(&key).await
        })
    }

    fn put(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        keyed_op(self, StoreOp::Put, key, |store, key| async move {
            store.upsert(&key, value).await
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
        Box::pin(async move { store.reopen().await.map_err(Into::into) })
    }
}
