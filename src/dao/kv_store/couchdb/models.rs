use serde::{Deserialize, Serialize};

/// Namespace keeping store entries apart from other documents in the database.
pub const KEY_PREFIX: &str = "kv::";

/// A single store entry persisted as its own CouchDB document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchValueDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub value: String,
}

impl CouchValueDocument {
    pub fn new(key: &str, value: String, rev: Option<String>) -> Self {
        Self {
            id: doc_id(key),
            rev,
            value,
        }
    }
}

pub fn doc_id(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_documents_omit_the_revision() {
        let doc = CouchValueDocument::new("QUEUE", "[]".into(), None);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["_id"], "kv::QUEUE");
        assert!(json.get("_rev").is_none());
    }

    #[test]
    fn stored_documents_carry_their_revision() {
        let doc: CouchValueDocument =
            serde_json::from_str(r#"{"_id":"kv::HISTORY","_rev":"3-abc","value":"[]"}"#).unwrap();
        assert_eq!(doc.rev.as_deref(), Some("3-abc"));
        assert_eq!(doc.value, "[]");
    }
}
