use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::domain::{ModelBRequest, PredictionInput};
use crate::error::KcatError;
use crate::http::{build_client, check_response, decode_json, transport_error};
use crate::predict::KcatPredictor;

#[derive(Debug, Serialize)]
pub struct DltKcatPayload<'a> {
    pub smiles: &'a str,
    pub seq: &'a str,
    pub temperature_celsius: f64,
}

#[derive(Debug, Deserialize)]
pub struct DltKcatReply {
    #[serde(default)]
    pub kcat: Option<f64>,
}

/// Client for the DLTKcat service (model B: structure + sequence + temperature).
#[derive(Clone)]
pub struct DltKcatHttpClient {
    client: Client,
    base_url: String,
}

impl DltKcatHttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, KcatError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }
}

#[async_trait]
impl KcatPredictor for DltKcatHttpClient {
    type Input = ModelBRequest;

    async fn predict_kcat(&self, input: &ModelBRequest) -> Result<Option<f64>, KcatError> {
        let temperature_celsius = input
            .temperature_celsius()
            .ok_or_else(|| KcatError::missing_fields(&["temperature_celsius"]))?;
        let url = self.predict_url();
        let payload = DltKcatPayload {
            smiles: input.substrate_smiles(),
            seq: input.protein_sequence(),
            temperature_celsius,
        };
        tracing::debug!(%url, temperature_celsius, "requesting DLTKcat prediction");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_response(response).await?;
        let reply: DltKcatReply = decode_json(response).await?;
        Ok(reply.kcat)
    }
}
