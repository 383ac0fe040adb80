use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::domain::{EnzymeRecord, Provenance, QueryFilter, format_kcat};
use crate::error::KcatError;
use crate::http::{build_client, check_response, decode_json, transport_error};
use crate::session::authorization_value;

/// A row as the enzyme database serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRecord {
    #[serde(default)]
    pub ec_number: Option<String>,
    #[serde(default)]
    pub prot_id: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub smiles: Option<String>,
    #[serde(default)]
    pub sequences: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    pub kcat: f64,
    #[serde(default)]
    pub formatted_kcat: Option<String>,
    #[serde(default)]
    pub predicted: Option<i64>,
}

impl From<BackendRecord> for EnzymeRecord {
    fn from(row: BackendRecord) -> Self {
        EnzymeRecord {
            ec_number: row.ec_number,
            prot_id: row.prot_id,
            substrate_name: row.sub,
            smiles: row.smiles,
            protein_sequence: row.sequences,
            temperature_celsius: row.temperature,
            kcat_value: row.kcat,
            formatted_kcat: row
                .formatted_kcat
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| format_kcat(row.kcat)),
            provenance: row
                .predicted
                .map(Provenance::from_code)
                .unwrap_or(Provenance::Experimental),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindKcatResponse {
    #[serde(default)]
    records: Option<Vec<BackendRecord>>,
}

/// Body of `POST /api/enzyme/save`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavePayload {
    pub sub: String,
    pub smiles: String,
    pub sequences: String,
    pub kcat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub predicted: i64,
}

/// Identifier the database assigns to a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(id) => write!(f, "{id}"),
            RecordId::Text(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SaveResponse {
    id: RecordId,
}

/// Transport to the enzyme database. The token is passed per call.
#[async_trait]
pub trait EnzymeBackend: Send + Sync {
    async fn find_kcat(
        &self,
        token: Option<&str>,
        filter: &QueryFilter,
    ) -> Result<Vec<BackendRecord>, KcatError>;

    async fn save_record(
        &self,
        token: Option<&str>,
        payload: &SavePayload,
    ) -> Result<RecordId, KcatError>;
}

#[derive(Clone)]
pub struct EnzymeHttpClient {
    client: Client,
    base_url: String,
}

impl EnzymeHttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, KcatError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    fn find_url(&self) -> String {
        format!("{}/api/enzyme/findKcat", self.base_url)
    }

    fn save_url(&self) -> String {
        format!("{}/api/enzyme/save", self.base_url)
    }
}

#[async_trait]
impl EnzymeBackend for EnzymeHttpClient {
    async fn find_kcat(
        &self,
        token: Option<&str>,
        filter: &QueryFilter,
    ) -> Result<Vec<BackendRecord>, KcatError> {
        let url = self.find_url();
        let params = filter.query_pairs();
        tracing::debug!(%url, ?params, authenticated = token.is_some(), "searching kcat records");
        let response = self
            .client
            .get(&url)
            .query(&params)
            .header(AUTHORIZATION, authorization_value(token))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_response(response).await?;
        let body: FindKcatResponse = decode_json(response).await?;
        Ok(body.records.unwrap_or_default())
    }

    async fn save_record(
        &self,
        token: Option<&str>,
        payload: &SavePayload,
    ) -> Result<RecordId, KcatError> {
        let url = self.save_url();
        tracing::debug!(%url, predicted = payload.predicted, "saving kcat record");
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization_value(token))
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_response(response).await?;
        let body: SaveResponse = decode_json(response).await?;
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_formatted_kcat_is_rendered() {
        let row: BackendRecord =
            serde_json::from_str(r#"{"ecNumber":"1.1.1.1","protId":"P00330","kcat":12.5}"#)
                .unwrap();
        let record = EnzymeRecord::from(row);
        assert_eq!(record.formatted_kcat, "12.5000");
        assert_eq!(record.provenance, Provenance::Experimental);
        assert_eq!(record.ec_number.as_deref(), Some("1.1.1.1"));
    }

    #[test]
    fn backend_formatting_and_provenance_are_kept() {
        let row: BackendRecord = serde_json::from_str(
            r#"{"sub":"ethanol","smiles":"CCO","kcat":3.2,"formattedKcat":"3.20","predicted":2}"#,
        )
        .unwrap();
        let record = EnzymeRecord::from(row);
        assert_eq!(record.formatted_kcat, "3.20");
        assert_eq!(record.provenance, Provenance::ModelB);
        assert_eq!(record.substrate_name.as_deref(), Some("ethanol"));
    }

    #[test]
    fn null_records_mean_no_matches() {
        let body: FindKcatResponse = serde_json::from_str(r#"{"records":null}"#).unwrap();
        assert!(body.records.unwrap_or_default().is_empty());
        let body: FindKcatResponse = serde_json::from_str("{}").unwrap();
        assert!(body.records.is_none());
    }

    #[test]
    fn save_payload_omits_absent_temperature() {
        let payload = SavePayload {
            sub: "ethanol".to_string(),
            smiles: "CCO".to_string(),
            sequences: "MKT".to_string(),
            kcat: 1.5,
            temperature: None,
            predicted: 1,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["predicted"], 1);
    }

    #[test]
    fn record_id_accepts_numbers_and_strings() {
        let numeric: SaveResponse = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(numeric.id.to_string(), "42");
        let text: SaveResponse = serde_json::from_str(r#"{"id":"a1b2"}"#).unwrap();
        assert_eq!(text.id, RecordId::Text("a1b2".to_string()));
    }
}
