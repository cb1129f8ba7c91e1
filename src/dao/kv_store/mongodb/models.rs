use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

pub const KV_COLLECTION: &str = "kv";

/// One store entry inside the `kv` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoValueDocument {
    #[serde(rename = "_id")]
    pub key: String,
    pub value: String,
}

pub fn key_filter(key: &str) -> Document {
    doc! { "_id": key }
}
