use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::clients::service_account::{ServiceAccountAuth, ServiceAccountKey};
use crate::config::Config;
use crate::models::{FieldValue, ScalarValue};
use crate::services::document_store::{DocumentBackend, StoredDocument};
use crate::services::error::StoreError;

const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: u32 = 300;

enum Credentials {
    /// The emulator accepts the fixed "owner" token and skips security rules
    Emulator,
    ServiceAccount(ServiceAccountAuth),
}

/// Firestore v1 REST client
pub struct FirestoreClient {
    http: Client,
    base_url: Url,
    project_id: String,
    database: String,
    credentials: Credentials,
}

impl FirestoreClient {
    /// Build the client from configuration, without contacting Firestore
    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.firestore_timeout_secs))
            .build()?;

        let key = config
            .service_account_json()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .map(|json| ServiceAccountKey::from_json(&json))
            .transpose()?;

        let project_id = config
            .firestore_project_id
            .clone()
            .or_else(|| key.as_ref().and_then(|k| k.project_id.clone()))
            .ok_or_else(|| StoreError::Unavailable("No Firestore project id configured".to_string()))?;

        let (base_url, credentials) = match &config.firestore_emulator_host {
            Some(host) => {
                info!("Using Firestore emulator at {}", host);
                (format!("http://{}/v1", host), Credentials::Emulator)
            }
            None => {
                let key = key.ok_or_else(|| {
                    StoreError::Unavailable("Firebase credentials are not configured".to_string())
                })?;
                let auth = ServiceAccountAuth::new(key, http.clone())?;
                info!("Authenticating to Firestore as {}", auth.client_email());
                (PRODUCTION_BASE_URL.to_string(), Credentials::ServiceAccount(auth))
            }
        };

        let base_url = Url::parse(&base_url)
            .map_err(|e| StoreError::Unavailable(format!("Invalid Firestore URL '{}': {}", base_url, e)))?;

        Ok(Self {
            http,
            base_url,
            project_id,
            database: config.firestore_database.clone(),
            credentials,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// URL of `.../databases/{db}/{last}` followed by `rest`, each percent-encoded
    fn url(&self, last: &str, rest: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("Invalid Firestore URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(["projects", self.project_id.as_str(), "databases", self.database.as_str(), last])
            .extend(rest);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder, what: &str) -> Result<Response, StoreError> {
        let request = match &self.credentials {
            Credentials::Emulator => request.bearer_auth("owner"),
            Credentials::ServiceAccount(auth) => request.bearer_auth(auth.access_token().await?),
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<WireErrorBody>(&body) {
            Ok(parsed) => parsed.error.message,
            Err(_) => {
                debug!("Unstructured error body from Firestore for {}: {}", what, body);
                format!("Firestore returned {}", status)
            }
        };
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{}: {}", what, message)));
        }
        Err(StoreError::Status { status: status.as_u16(), message })
    }

    async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, StoreError> {
        response.json::<T>().await.map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DocumentBackend for FirestoreClient {
    async fn list_collection_ids(&self) -> Result<Vec<String>, StoreError> {
        let url = self.url("documents:listCollectionIds", &[])?;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = json!({ "pageSize": PAGE_SIZE });
            if let Some(token) = &page_token {
                body["pageToken"] = json!(token);
            }
            let response = self.execute(self.http.post(url.clone()).json(&body), "collections").await?;
            let page: WireCollectionIds = Self::decode(response).await?;
            ids.extend(page.collection_ids);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} collections", ids.len());
        Ok(ids)
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url("documents", &[collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            let response = self.execute(self.http.get(url), collection).await?;
            let page: WireDocumentList = Self::decode(response).await?;
            for document in page.documents {
                documents.push(document.into_stored()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Listed {} documents in '{}'", documents.len(), collection);
        Ok(documents)
    }

    async fn get_document(&self, collection: &str, doc_id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let url = self.url("documents", &[collection, doc_id])?;
        let what = format!("{}/{}", collection, doc_id);
        match self.execute(self.http.get(url), &what).await {
            Ok(response) => {
                let document: WireDocument = Self::decode(response).await?;
                Ok(Some(document.into_stored()?))
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_fields(
        &self,
        collection: &str,
        doc_id: &str,
        fields: BTreeMap<String, ScalarValue>,
    ) -> Result<(), StoreError> {
        let mut url = self.url("documents", &[collection, doc_id])?;
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &quote_field_path(name));
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let body = WireDocument {
            name: String::new(),
            fields: fields.into_iter().map(|(name, value)| (name, encode_scalar(value))).collect(),
        };
        let what = format!("{}/{}", collection, doc_id);
        self.execute(self.http.patch(url).json(&body), &what).await?;
        Ok(())
    }
}

/// Field path as Firestore expects it in an update mask: simple names are used
/// as-is, anything else is backtick-quoted.
pub fn quote_field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        return name.to_string();
    }
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCollectionIds {
    #[serde(default)]
    collection_ids: Vec<String>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDocumentList {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

impl WireDocument {
    fn into_stored(self) -> Result<StoredDocument, StoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("Document name '{}' has no id", self.name)))?
            .to_string();
        let fields = self
            .fields
            .into_iter()
            .map(|(name, value)| decode_value(value).map(|v| (name, v)))
            .collect::<Result<_, _>>()?;
        Ok(StoredDocument { id, fields })
    }
}

/// Firestore's tagged JSON value encoding, e.g. `{"integerValue": "30"}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireValue {
    NullValue(Option<String>),
    BooleanValue(bool),
    IntegerValue(Value),
    DoubleValue(Value),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(WireLatLng),
    ArrayValue(WireArray),
    MapValue(WireMap),
}

#[derive(Debug, Serialize, Deserialize)]
struct WireLatLng {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireArray {
    #[serde(default)]
    values: Vec<WireValue>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMap {
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

fn decode_value(value: WireValue) -> Result<FieldValue, StoreError> {
    Ok(match value {
        WireValue::NullValue(_) => FieldValue::Null,
        WireValue::BooleanValue(b) => FieldValue::Boolean(b),
        WireValue::IntegerValue(raw) => {
            let parsed = match &raw {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            FieldValue::Integer(parsed.ok_or_else(|| StoreError::Decode(format!("Invalid integerValue {}", raw)))?)
        }
        WireValue::DoubleValue(raw) => {
            let parsed = match &raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };
            FieldValue::Double(parsed.ok_or_else(|| StoreError::Decode(format!("Invalid doubleValue {}", raw)))?)
        }
        WireValue::TimestampValue(ts) => FieldValue::Timestamp(ts),
        WireValue::StringValue(s) => FieldValue::String(s),
        WireValue::BytesValue(encoded) => FieldValue::Bytes(
            general_purpose::STANDARD
                .decode(&encoded)
                .map_err(|e| StoreError::Decode(format!("Invalid bytesValue: {}", e)))?,
        ),
        WireValue::ReferenceValue(r) => FieldValue::Reference(r),
        WireValue::GeoPointValue(p) => FieldValue::GeoPoint { latitude: p.latitude, longitude: p.longitude },
        WireValue::ArrayValue(a) => FieldValue::Array(
            a.values.into_iter().map(decode_value).collect::<Result<_, _>>()?,
        ),
        WireValue::MapValue(m) => FieldValue::Map(
            m.fields
                .into_iter()
                .map(|(k, v)| decode_value(v).map(|v| (k, v)))
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn encode_scalar(value: ScalarValue) -> WireValue {
    match value {
        // int64 travels as a decimal string
        ScalarValue::Integer(n) => WireValue::IntegerValue(Value::String(n.to_string())),
        ScalarValue::Text(s) => WireValue::StringValue(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_paths_are_quoted_when_needed() {
        assert_eq!(quote_field_path("age"), "age");
        assert_eq!(quote_field_path("_previous_age"), "_previous_age");
        assert_eq!(quote_field_path("first name"), "`first name`");
        assert_eq!(quote_field_path("2fa"), "`2fa`");
        assert_eq!(quote_field_path("a.b"), "`a.b`");
        assert_eq!(quote_field_path("we`ird"), "`we\\`ird`");
    }

    #[test]
    fn decodes_every_value_kind() {
        let raw = json!({
            "name": "projects/demo/databases/(default)/documents/users/ada",
            "fields": {
                "age": { "integerValue": "36" },
                "name": { "stringValue": "Ada" },
                "admin": { "booleanValue": true },
                "score": { "doubleValue": 9.5 },
                "inf": { "doubleValue": "Infinity" },
                "nothing": { "nullValue": null },
                "born": { "timestampValue": "1815-12-10T00:00:00Z" },
                "avatar": { "bytesValue": "aGk=" },
                "team": { "referenceValue": "projects/demo/databases/(default)/documents/teams/a" },
                "home": { "geoPointValue": { "latitude": 51.5, "longitude": -0.12 } },
                "tags": { "arrayValue": { "values": [ { "stringValue": "math" } ] } },
                "empty": { "arrayValue": {} },
                "meta": { "mapValue": { "fields": { "n": { "integerValue": "1" } } } }
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        });
        let document: WireDocument = serde_json::from_value(raw).unwrap();
        let stored = document.into_stored().unwrap();

        assert_eq!(stored.id, "ada");
        let f = &stored.fields;
        assert_eq!(f["age"], FieldValue::Integer(36));
        assert_eq!(f["name"], FieldValue::String("Ada".into()));
        assert_eq!(f["admin"], FieldValue::Boolean(true));
        assert_eq!(f["score"], FieldValue::Double(9.5));
        assert_eq!(f["inf"], FieldValue::Double(f64::INFINITY));
        assert_eq!(f["nothing"], FieldValue::Null);
        assert_eq!(f["born"], FieldValue::Timestamp("1815-12-10T00:00:00Z".into()));
        assert_eq!(f["avatar"], FieldValue::Bytes(b"hi".to_vec()));
        assert!(matches!(f["team"], FieldValue::Reference(_)));
        assert_eq!(f["home"], FieldValue::GeoPoint { latitude: 51.5, longitude: -0.12 });
        assert_eq!(f["tags"], FieldValue::Array(vec![FieldValue::String("math".into())]));
        assert_eq!(f["empty"], FieldValue::Array(vec![]));
        assert_eq!(
            f["meta"],
            FieldValue::Map(BTreeMap::from([("n".to_string(), FieldValue::Integer(1))]))
        );
    }

    #[test]
    fn malformed_integer_is_a_decode_error() {
        let value: WireValue = serde_json::from_value(json!({ "integerValue": "abc" })).unwrap();
        assert!(matches!(decode_value(value), Err(StoreError::Decode(_))));
    }

    #[test]
    fn scalars_encode_as_tagged_values() {
        assert_eq!(
            serde_json::to_value(encode_scalar(ScalarValue::Integer(31))).unwrap(),
            json!({ "integerValue": "31" })
        );
        assert_eq!(
            serde_json::to_value(encode_scalar(ScalarValue::Text("Ada".into()))).unwrap(),
            json!({ "stringValue": "Ada" })
        );
    }

    #[test]
    fn emulator_config_needs_a_project_but_no_key() {
        let config = Config {
            firestore_emulator_host: Some("127.0.0.1:8080".into()),
            firestore_project_id: Some("demo".into()),
            ..Config::default()
        };
        let client = FirestoreClient::from_config(&config).unwrap();
        assert_eq!(client.project_id(), "demo");
        assert_eq!(
            client.url("documents", &["users", "ada"]).unwrap().as_str(),
            "http://127.0.0.1:8080/v1/projects/demo/databases/(default)/documents/users/ada"
        );

        let config = Config {
            firestore_emulator_host: Some("127.0.0.1:8080".into()),
            ..Config::default()
        };
        assert!(matches!(FirestoreClient::from_config(&config), Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn production_config_without_key_is_unavailable() {
        let config = Config { firestore_project_id: Some("demo".into()), ..Config::default() };
        assert!(matches!(FirestoreClient::from_config(&config), Err(StoreError::Unavailable(_))));

        let config = Config { firebase_key: Some("{not json".into()), ..Config::default() };
        assert!(matches!(FirestoreClient::from_config(&config), Err(StoreError::Auth(_))));
    }

    #[test]
    fn document_ids_with_spaces_are_percent_encoded() {
        let config = Config {
            firestore_emulator_host: Some("localhost:8080".into()),
            firestore_project_id: Some("demo".into()),
            ..Config::default()
        };
        let client = FirestoreClient::from_config(&config).unwrap();
        let url = client.url("documents", &["users", "ada lovelace"]).unwrap();
        assert!(url.as_str().ends_with("/documents/users/ada%20lovelace"));
    }
}
