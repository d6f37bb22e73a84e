use std::cmp::Ordering;

use thiserror::Error;

use super::model::{CellField, CellSpec};

// ---------------------------------------------------------------------------
// Query description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: CellField,
    pub ascending: bool,
}

/// One read against the cell table: which table, which columns, which order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellQuery {
    pub table: String,
    pub order: Vec<OrderBy>,
}

impl CellQuery {
    /// All cells, manufacturer then model, both ascending.
    pub fn cells(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            order: vec![
                OrderBy {
                    field: CellField::Manufacturer,
                    ascending: true,
                },
                OrderBy {
                    field: CellField::Model,
                    ascending: true,
                },
            ],
        }
    }

    /// `id` plus every named field, comma separated.
    pub fn select_list(&self) -> String {
        std::iter::once("id")
            .chain(CellField::ALL.iter().map(|f| f.column_name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// PostgREST `order` parameter, e.g. `manufacturer.asc,model.asc`.
    pub fn order_param(&self) -> String {
        self.order
            .iter()
            .map(|o| {
                let dir = if o.ascending { "asc" } else { "desc" };
                format!("{}.{dir}", o.field.column_name())
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Sort rows the way the relational store would: byte-wise text
    /// comparison, nulls last when ascending and first when descending.
    pub fn apply_order(&self, rows: &mut [CellSpec]) {
        rows.sort_by(|a, b| {
            self.order
                .iter()
                .map(|o| {
                    let ord = a.get(o.field).compare(&b.get(o.field), false);
                    if o.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("store answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("{path}: {message}")]
    File { path: String, message: String },
}

/// Read access to the cell table. Implementations must return rows in the
/// order described by `query.order`. `Ok(None)` means the store answered
/// without a row set.
pub trait CellStore: Send + Sync {
    fn fetch_cells(&self, query: &CellQuery) -> Result<Option<Vec<CellSpec>>, StoreError>;

    /// Short human-readable description for the status bar.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// Hosted table (PostgREST / Supabase)
// ---------------------------------------------------------------------------

/// Client for a table exposed through PostgREST, as hosted by Supabase.
pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn endpoint(&self, query: &CellQuery) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            query.table
        )
    }

    fn request(&self, query: &CellQuery) -> reqwest::blocking::RequestBuilder {
        let url = self.endpoint(query);
        log::debug!("GET {url} order={}", query.order_param());

        let request = self
            .client
            .get(&url)
            .query(&[("select", query.select_list()), ("order", query.order_param())])
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }
}

/// Map a PostgREST reply onto the store contract. A `null` body means the
/// table answered without a row set.
fn decode_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<Option<Vec<CellSpec>>, StoreError> {
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))
}

impl CellStore for RestStore {
    fn fetch_cells(&self, query: &CellQuery) -> Result<Option<Vec<CellSpec>>, StoreError> {
        let response = self
            .request(query)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        decode_response(status, &body)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::AUTHORIZATION;
    use reqwest::StatusCode;

    use super::*;

    fn cell(id: i64, manufacturer: Option<&str>, model: Option<&str>) -> CellSpec {
        CellSpec {
            id,
            manufacturer: manufacturer.map(Into::into),
            model: model.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn select_list_names_id_and_all_fields() {
        let select = CellQuery::cells("cells").select_list();
        let names: Vec<&str> = select.split(',').collect();
        assert_eq!(names.len(), 18);
        assert_eq!(names[0], "id");
        assert!(names.contains(&"internal_resistance__initial_mohm"));
        assert!(names.contains(&"temperature_oparating_max_celcius"));
    }

    #[test]
    fn order_param_is_manufacturer_then_model() {
        assert_eq!(
            CellQuery::cells("cells").order_param(),
            "manufacturer.asc,model.asc"
        );
    }

    #[test]
    fn apply_order_sorts_by_manufacturer_then_model() {
        let mut rows = vec![
            cell(1, Some("Samsung"), Some("50E")),
            cell(2, Some("EVE"), Some("LF280K")),
            cell(3, Some("Samsung"), Some("35E")),
            cell(4, Some("EVE"), Some("LF105")),
        ];
        CellQuery::cells("cells").apply_order(&mut rows);
        let ids: Vec<i64> = rows.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn apply_order_puts_nulls_last_and_is_case_sensitive() {
        let mut rows = vec![
            cell(1, None, Some("A")),
            cell(2, Some("molicel"), None),
            cell(3, Some("Molicel"), Some("P45B")),
            cell(4, Some("Molicel"), None),
        ];
        CellQuery::cells("cells").apply_order(&mut rows);
        let ids: Vec<i64> = rows.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);
    }

    #[test]
    fn descending_order_reverses() {
        let mut query = CellQuery::cells("cells");
        query.order[0].ascending = false;
        let mut rows = vec![cell(1, Some("A"), None), cell(2, Some("B"), None)];
        query.apply_order(&mut rows);
        assert_eq!(rows[0].id, 2);
        assert_eq!(query.order_param(), "manufacturer.desc,model.asc");
    }

    #[test]
    fn endpoint_joins_base_url_and_table() {
        let store = RestStore::new("https://example.supabase.co/", None);
        assert_eq!(
            store.endpoint(&CellQuery::cells("cells")),
            "https://example.supabase.co/rest/v1/cells"
        );
    }

    #[test]
    fn null_body_means_no_rows() {
        assert_eq!(decode_response(StatusCode::OK, "null").unwrap(), None);
        assert_eq!(decode_response(StatusCode::OK, "[]").unwrap(), Some(vec![]));
    }

    #[test]
    fn rows_are_decoded_from_store_column_names() {
        let body = r#"[{"id": 3, "manufacturer": "Molicel", "model": "P45B",
                        "internal_resistance__initial_mohm": 11.0, "mass_g": null}]"#;
        let rows = decode_response(StatusCode::OK, body).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);
        assert_eq!(rows[0].internal_resistance_initial_mohm, Some(11.0));
        assert_eq!(rows[0].mass_g, None);
    }

    #[test]
    fn error_status_keeps_body() {
        let err = decode_response(StatusCode::UNAUTHORIZED, r#"{"message":"Invalid API key"}"#)
            .unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = decode_response(StatusCode::OK, "[{\"id\": ").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)), "{err:?}");
    }

    #[test]
    fn api_key_is_sent_as_apikey_and_bearer() {
        let store = RestStore::new("https://example.supabase.co", Some("secret".into()));
        let request = store
            .request(&CellQuery::cells("cells"))
            .build()
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers.get("apikey").unwrap().to_str().unwrap(), "secret");
        assert_eq!(
            headers.get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer secret"
        );

        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("order".into(), "manufacturer.asc,model.asc".into())));
        assert_eq!(request.url().path(), "/rest/v1/cells");
    }

    #[test]
    fn no_auth_headers_without_key() {
        let store = RestStore::new("https://example.supabase.co", None);
        let request = store
            .request(&CellQuery::cells("cells"))
            .build()
            .unwrap();
        assert!(request.headers().get("apikey").is_none());
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }
}
