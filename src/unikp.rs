use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::domain::{ModelARequest, PredictionInput};
use crate::error::KcatError;
use crate::http::{build_client, check_response, decode_json, transport_error};
use crate::predict::KcatPredictor;

#[derive(Debug, Serialize)]
pub struct UniKpPayload<'a> {
    pub substrate_smiles: &'a str,
    pub protein_sequence: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UniKpReply {
    #[serde(default)]
    pub kcat_value: Option<f64>,
}

/// Client for the UniKP service (model A: structure + sequence).
#[derive(Clone)]
pub struct UniKpHttpClient {
    client: Client,
    base_url: String,
}

impl UniKpHttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, KcatError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    fn predict_url(&self) -> String {
        format!("{}/predict_kcat", self.base_url)
    }
}

#[async_trait]
impl KcatPredictor for UniKpHttpClient {
    type Input = ModelARequest;

    async fn predict_kcat(&self, input: &ModelARequest) -> Result<Option<f64>, KcatError> {
        let url = self.predict_url();
        let payload = UniKpPayload {
            substrate_smiles: input.substrate_smiles(),
            protein_sequence: input.protein_sequence(),
        };
        tracing::debug!(%url, "requesting UniKP prediction");
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_response(response).await?;
        let reply: UniKpReply = decode_json(response).await?;
        Ok(reply.kcat_value)
    }
}
