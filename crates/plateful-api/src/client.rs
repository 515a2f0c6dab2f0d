// Remote data store HTTP client
//
// Wraps `reqwest::Client` with PostgREST-style URL construction, row
// decoding, and status-to-taxonomy error mapping. Every resource exposes
// the same five operations: list, create, update, delete, reorder. The
// generic helpers keep the per-resource methods down to one line each.

use reqwest::{Response, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{CategoryRow, ContentRow, ProductRow, StoreErrorBody};

const REST_PREFIX: &str = "rest/v1";

/// Raw HTTP client for the remote data store.
///
/// Rows come back unwrapped: callers see `Vec<Row>` or a single `Row`,
/// never the HTTP layer. Create/update/delete request the mutated
/// representation back (`Prefer: return=representation`) so the caller
/// always receives the server-confirmed record.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl StoreClient {
    /// Create a new store client from a `TransportConfig`.
    ///
    /// `base_url` is the store root (e.g. `https://xyz.supabase.co`); the
    /// REST prefix is appended per request. The service key ends up in the
    /// client's default headers and never appears in per-call code.
    pub fn new(
        base_url: Url,
        service_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(service_key)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a store client with a pre-built `reqwest::Client`.
    ///
    /// Use this when the client already carries auth headers (e.g. in tests
    /// against a mock server that doesn't check them).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout_secs: 30,
        }
    }

    // ── Categories ──────────────────────────────────────────────────

    pub async fn list_categories(&self, restaurant: &str) -> Result<Vec<CategoryRow>, Error> {
        self.list_rows("categories", restaurant, None).await
    }

    pub async fn create_category<B: Serialize + Sync>(
        &self,
        restaurant: &str,
        fields: &B,
    ) -> Result<CategoryRow, Error> {
        self.insert_row("categories", restaurant, fields).await
    }

    pub async fn update_category<B: Serialize + Sync>(
        &self,
        id: &str,
        fields: &B,
    ) -> Result<CategoryRow, Error> {
        self.patch_row("categories", id, fields).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<CategoryRow, Error> {
        self.delete_row("categories", id).await
    }

    pub async fn reorder_categories(
        &self,
        restaurant: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<CategoryRow>, Error> {
        self.reorder_rows("categories", restaurant, ordered_ids)
            .await
    }

    // ── Products ────────────────────────────────────────────────────

    pub async fn list_products(
        &self,
        restaurant: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<ProductRow>, Error> {
        let filter = category_id.map(|c| ("category_id", c));
        self.list_rows("products", restaurant, filter).await
    }

    pub async fn create_product<B: Serialize + Sync>(
        &self,
        restaurant: &str,
        fields: &B,
    ) -> Result<ProductRow, Error> {
        self.insert_row("products", restaurant, fields).await
    }

    pub async fn update_product<B: Serialize + Sync>(
        &self,
        id: &str,
        fields: &B,
    ) -> Result<ProductRow, Error> {
        self.patch_row("products", id, fields).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<ProductRow, Error> {
        self.delete_row("products", id).await
    }

    pub async fn reorder_products(
        &self,
        restaurant: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<ProductRow>, Error> {
        self.reorder_rows("products", restaurant, ordered_ids).await
    }

    // ── Content ─────────────────────────────────────────────────────

    pub async fn list_content(
        &self,
        restaurant: &str,
        slot: Option<&str>,
    ) -> Result<Vec<ContentRow>, Error> {
        let filter = slot.map(|s| ("slot", s));
        self.list_rows("content", restaurant, filter).await
    }

    pub async fn create_content<B: Serialize + Sync>(
        &self,
        restaurant: &str,
        fields: &B,
    ) -> Result<ContentRow, Error> {
        self.insert_row("content", restaurant, fields).await
    }

    pub async fn update_content<B: Serialize + Sync>(
        &self,
        id: &str,
        fields: &B,
    ) -> Result<ContentRow, Error> {
        self.patch_row("content", id, fields).await
    }

    pub async fn delete_content(&self, id: &str) -> Result<ContentRow, Error> {
        self.delete_row("content", id).await
    }

    pub async fn reorder_content(
        &self,
        restaurant: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<ContentRow>, Error> {
        self.reorder_rows("content", restaurant, ordered_ids).await
    }

    // ── Generic helpers ─────────────────────────────────────────────

    fn table_url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("{REST_PREFIX}/{table}"))?)
    }

    fn rpc_url(&self, function: &str) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("{REST_PREFIX}/rpc/{function}"))?)
    }

    async fn list_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        restaurant: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<T>, Error> {
        let url = self.table_url(table)?;
        let mut request = self.http.get(url).query(&[
            ("restaurant_id", format!("eq.{restaurant}")),
            ("order", "sort_order.asc".into()),
        ]);
        if let Some((column, value)) = filter {
            request = request.query(&[(column, format!("eq.{value}"))]);
        }
        trace!(table, restaurant, ?filter, "listing rows");

        let response = self.send(request).await?;
        decode(response).await
    }

    async fn insert_row<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        restaurant: &str,
        fields: &B,
    ) -> Result<T, Error> {
        // The tenant column is owned by this layer, not by the callers'
        // field structs, so it gets merged into the payload here.
        let mut payload = serde_json::to_value(fields).map_err(|e| Error::Decode {
            message: format!("failed to serialize insert payload: {e}"),
            body: String::new(),
        })?;
        if let Some(map) = payload.as_object_mut() {
            map.insert("restaurant_id".into(), json!(restaurant));
        }
        debug!(table, restaurant, "inserting row");

        let request = self
            .http
            .post(self.table_url(table)?)
            .header("Prefer", "return=representation")
            .json(&payload);
        let response = self.send(request).await?;
        decode_single(response).await
    }

    async fn patch_row<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        table: &str,
        id: &str,
        fields: &B,
    ) -> Result<T, Error> {
        debug!(table, id, "updating row");
        let request = self
            .http
            .patch(self.table_url(table)?)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(fields);
        let response = self.send(request).await?;
        decode_single(response).await
    }

    async fn delete_row<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<T, Error> {
        debug!(table, id, "deleting row");
        let request = self
            .http
            .delete(self.table_url(table)?)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");
        let response = self.send(request).await?;
        decode_single(response).await
    }

    /// Call the store's `reorder_<table>` function, which rewrites
    /// `sort_order` atomically server-side and returns the reordered rows.
    async fn reorder_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        restaurant: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<T>, Error> {
        debug!(table, restaurant, count = ordered_ids.len(), "reordering rows");
        let request = self.http.post(self.rpc_url(&format!("reorder_{table}"))?).json(&json!({
            "p_restaurant_id": restaurant,
            "p_ordered_ids": ordered_ids,
        }));
        let response = self.send(request).await?;
        decode(response).await
    }

    /// Send a request, mapping transport faults and non-2xx statuses into
    /// the error taxonomy.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Network(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(error_from_response(status, response).await)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let body = response.text().await.map_err(Error::Network)?;
    serde_json::from_str(&body).map_err(|e| Error::Decode {
        message: e.to_string(),
        body,
    })
}

/// Decode a representation array and unwrap its single affected row.
async fn decode_single<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let mut rows: Vec<T> = decode(response).await?;
    match rows.len() {
        1 => Ok(rows.remove(0)),
        n => Err(Error::Validation {
            status: 404,
            message: format!("expected exactly one affected row, store returned {n}"),
            code: None,
        }),
    }
}

/// Map a non-2xx response to the taxonomy, pulling the message out of the
/// store's error body when one is present.
async fn error_from_response(status: StatusCode, response: Response) -> Error {
    let body = response.text().await.unwrap_or_default();
    let parsed: StoreErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    let status = status.as_u16();
    match status {
        401 | 403 => Error::Auth { status, message },
        400..=499 => Error::Validation {
            status,
            message,
            code: parsed.code,
        },
        _ => Error::Remote { status, message },
    }
}
