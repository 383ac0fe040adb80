use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::error::KcatError;
use crate::http::{build_client, check_response, decode_json, transport_error};

/// Best-effort substrate naming. Absence is a normal outcome, never an error.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve_name(&self, smiles: &str) -> Option<String>;
}

#[derive(Clone)]
pub struct PubchemHttpClient {
    client: Client,
    base_url: String,
}

impl PubchemHttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, KcatError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    pub fn title_url(&self, smiles: &str) -> String {
        format!(
            "{}/compound/smiles/{}/property/Title/JSON",
            self.base_url,
            urlencoding::encode(smiles)
        )
    }

    async fn lookup_title(&self, smiles: &str) -> Result<Option<String>, KcatError> {
        let url = self.title_url(smiles);
        tracing::debug!(%url, "looking up substrate name");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        title_from_response(response).await
    }
}

async fn title_from_response(response: Response) -> Result<Option<String>, KcatError> {
    let response = check_response(response).await?;
    let raw: Value = decode_json(response).await?;
    Ok(extract_title(&raw))
}

/// Folds a lookup outcome into the best-effort name.
fn name_from_lookup(smiles: &str, outcome: Result<Option<String>, KcatError>) -> Option<String> {
    match outcome {
        Ok(Some(title)) => Some(title),
        Ok(None) => {
            tracing::debug!(smiles, "no compound title found");
            None
        }
        Err(err) => {
            tracing::warn!(smiles, %err, "substrate name lookup failed");
            None
        }
    }
}

#[async_trait]
impl NameResolver for PubchemHttpClient {
    async fn resolve_name(&self, smiles: &str) -> Option<String> {
        let smiles = smiles.trim();
        if smiles.is_empty() {
            return None;
        }
        name_from_lookup(smiles, self.lookup_title(smiles).await)
    }
}

/// `PropertyTable.Properties[0].Title` from a PUG REST property reply.
pub fn extract_title(raw: &Value) -> Option<String> {
    raw.get("PropertyTable")
        .and_then(|value| value.get("Properties"))
        .and_then(|value| value.as_array())
        .and_then(|array| array.first())
        .and_then(|value| value.get("Title"))
        .and_then(|value| value.as_str())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
