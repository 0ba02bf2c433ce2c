//! Hosted backend client (PostgREST dialect).
//!
//! Rows travel as JSON objects keyed by column name. Filters are encoded as
//! `column=op.value`, counts come from the `Content-Range` header, and
//! inserts/deletes ask for `return=representation` so the stored rows come
//! back in the response body.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::{BackingStore, Filter, FilterOp, Query, Resource, ResourceSpec, Row, StoreError};

pub struct RestStore {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    /// Built on first use so construction never happens on an async thread.
    client: OnceLock<Client>,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&Client, StoreError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(self.client.get_or_init(|| client))
    }

    fn table_url(&self, spec: &ResourceSpec) -> String {
        format!("{}/rest/v1/{}", self.base_url, spec.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self.authorized(request).send().map_err(|e| {
            if e.is_timeout() {
                StoreError::Http(format!("Request timed out after {}s", self.timeout_secs))
            } else if e.is_connect() {
                StoreError::Http(format!("Cannot reach backend at {}", self.base_url))
            } else {
                StoreError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::Backend {
                status: status.as_u16(),
                message: backend_message(&body, status.as_u16()),
            });
        }
        Ok(response)
    }
}

impl BackingStore for RestStore {
    fn select(&self, resource: Resource, query: &Query) -> Result<Vec<Row>, StoreError> {
        let spec = resource.spec();
        let params = select_params(spec, query)?;
        tracing::debug!(table = spec.table, "rest select");
        let client = self.client()?;
        let response = self.send(client.get(self.table_url(spec)).query(&params))?;
        parse_rows(response)
    }

    fn count(&self, resource: Resource, filters: &[Filter]) -> Result<u64, StoreError> {
        let spec = resource.spec();
        let mut params = vec![("select".to_string(), spec.primary_key.to_string())];
        for filter in filters {
            params.push(filter_param(spec, filter)?);
        }
        let client = self.client()?;
        let response = self.send(
            client
                .head(self.table_url(spec))
                .query(&params)
                .header("Prefer", "count=exact"),
        )?;
        response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Malformed("missing Content-Range count".into()))
    }

    fn insert(&self, resource: Resource, row: Row) -> Result<Row, StoreError> {
        let spec = resource.spec();
        let mut body = Row::new();
        for (key, value) in row {
            if key == spec.primary_key {
                continue;
            }
            body.insert(spec.column(&key)?.to_string(), value);
        }
        let client = self.client()?;
        let response = self.send(
            client
                .post(self.table_url(spec))
                .header("Prefer", "return=representation")
                .json(&body),
        )?;
        parse_rows(response)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed(format!("insert into {} returned no row", spec.table)))
    }

    fn delete(&self, resource: Resource, id: i64) -> Result<u64, StoreError> {
        let spec = resource.spec();
        let client = self.client()?;
        let response = self.send(
            client
                .delete(self.table_url(spec))
                .query(&[(spec.primary_key, format!("eq.{id}"))])
                .header("Prefer", "return=representation"),
        )?;
        Ok(parse_rows(response)?.len() as u64)
    }
}

fn parse_rows(response: Response) -> Result<Vec<Row>, StoreError> {
    let body: Value = response
        .json()
        .map_err(|e| StoreError::Malformed(e.to_string()))?;
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Malformed(format!("expected object row, got {other}"))),
            })
            .collect(),
        other => Err(StoreError::Malformed(format!("expected row array, got {other}"))),
    }
}

fn select_params(spec: &ResourceSpec, query: &Query) -> Result<Vec<(String, String)>, StoreError> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for filter in &query.filters {
        params.push(filter_param(spec, filter)?);
    }
    let order = match &query.order {
        Some(order) => {
            let column = spec.column(&order.column)?;
            let dir = if order.ascending { "asc" } else { "desc" };
            format!("{column}.{dir},{}.asc", spec.primary_key)
        }
        None => format!("{}.asc", spec.primary_key),
    };
    params.push(("order".to_string(), order));
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    Ok(params)
}

fn filter_param(spec: &ResourceSpec, filter: &Filter) -> Result<(String, String), StoreError> {
    let column = spec.column(&filter.column)?;
    let op = match filter.op {
        FilterOp::Eq => "eq",
        FilterOp::Gte => "gte",
        FilterOp::Lt => "lt",
    };
    let value = match &filter.value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok((column.to_string(), format!("{op}.{value}")))
}

/// `Content-Range: 0-24/3573` or `*/0` → total after the slash.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Prefer the backend's `message` field, fall back to the raw body.
fn backend_message(body: &str, status: u16) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    match parsed.as_ref().and_then(|v| v.get("message")).and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => format!("Backend returned status {status}"),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let store = RestStore::new("https://db.example.com/", "key", 10);
        assert_eq!(
            store.table_url(Resource::MedicalHistories.spec()),
            "https://db.example.com/rest/v1/medical_history"
        );
    }

    #[test]
    fn select_params_encode_filters_order_and_limit() {
        let query = Query::all()
            .filter(Filter::gte("appointment_date", "2024-01-01T00:00:00"))
            .order_by("appointment_date", true)
            .limit(5);
        let params = select_params(Resource::Appointments.spec(), &query).unwrap();
        assert!(params.contains(&("select".into(), "*".into())));
        assert!(params.contains(&("appointment_date".into(), "gte.2024-01-01T00:00:00".into())));
        assert!(params.contains(&("order".into(), "appointment_date.asc,appointment_id.asc".into())));
        assert!(params.contains(&("limit".into(), "5".into())));
    }

    #[test]
    fn default_order_is_primary_key() {
        let params = select_params(Resource::Insurance.spec(), &Query::all()).unwrap();
        assert!(params.contains(&("order".into(), "insurance_id.asc".into())));
    }

    #[test]
    fn numeric_filter_values_are_unquoted() {
        let (col, value) = filter_param(Resource::Billings.spec(), &Filter::eq("patient_id", 7)).unwrap();
        assert_eq!(col, "patient_id");
        assert_eq!(value, "eq.7");
    }

    #[test]
    fn unknown_filter_column_is_rejected() {
        let result = filter_param(Resource::Billings.spec(), &Filter::eq("secret", 1));
        assert!(matches!(result, Err(StoreError::UnknownColumn { .. })));
    }

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-24/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn backend_message_prefers_json_message() {
        let body = r#"{"code":"23503","message":"insert or update on table \"appointment\" violates foreign key constraint"}"#;
        assert!(backend_message(body, 409).starts_with("insert or update"));
        assert_eq!(backend_message("plain failure", 500), "plain failure");
        assert_eq!(backend_message("", 502), "Backend returned status 502");
    }

    #[test]
    fn unreachable_backend_is_an_http_error() {
        let store = RestStore::new("http://127.0.0.1:9", "key", 2);
        let result = store.count(Resource::Patients, &[]);
        assert!(matches!(result, Err(StoreError::Http(_))));
    }
}
