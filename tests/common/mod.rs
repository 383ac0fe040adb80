#![allow(dead_code)]

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use kcat_hub::auth::LoginRedirect;
use kcat_hub::domain::{ModelARequest, ModelBRequest, PredictionInput, QueryFilter};
use kcat_hub::enzyme_api::{BackendRecord, EnzymeBackend, RecordId, SavePayload};
use kcat_hub::error::KcatError;
use kcat_hub::http::classify_status;
use kcat_hub::predict::KcatPredictor;
use kcat_hub::pubchem::NameResolver;
use kcat_hub::session::{SessionStore, User};

/// How a mock remote service answers.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    Status(u16, &'static str),
    Offline,
}

impl Reply {
    fn into_result(self) -> Result<(), KcatError> {
        match self {
            Reply::Ok => Ok(()),
            Reply::Status(status, body) => Err(classify_status(
                StatusCode::from_u16(status).unwrap(),
                body,
            )),
            Reply::Offline => Err(KcatError::Network("connection refused".to_string())),
        }
    }
}

#[derive(Clone)]
pub struct MockBackend {
    pub records: Arc<Mutex<Vec<BackendRecord>>>,
    pub saved: Arc<Mutex<Vec<SavePayload>>>,
    pub tokens: Arc<Mutex<Vec<Option<String>>>>,
    pub find_calls: Arc<AtomicUsize>,
    pub save_calls: Arc<AtomicUsize>,
    pub reply: Arc<Mutex<Reply>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            saved: Arc::default(),
            tokens: Arc::default(),
            find_calls: Arc::default(),
            save_calls: Arc::default(),
            reply: Arc::new(Mutex::new(Reply::Ok)),
        }
    }
}

impl MockBackend {
    pub fn with_records(records: Vec<BackendRecord>) -> Self {
        let backend = Self::default();
        *backend.records.lock().unwrap() = records;
        backend
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<String> {
        self.tokens.lock().unwrap().last().cloned().flatten()
    }
}

fn matches(record: &BackendRecord, key: &str, value: &str) -> bool {
    let field = match key {
        "ecNumber" => &record.ec_number,
        "protId" => &record.prot_id,
        "sub" => &record.sub,
        "smiles" => &record.smiles,
        _ => return false,
    };
    field.as_deref() == Some(value)
}

#[async_trait]
impl EnzymeBackend for MockBackend {
    async fn find_kcat(
        &self,
        token: Option<&str>,
        filter: &QueryFilter,
    ) -> Result<Vec<BackendRecord>, KcatError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.map(str::to_string));
        let reply = *self.reply.lock().unwrap();
        reply.into_result()?;
        let pairs = filter.query_pairs();
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| {
                pairs
                    .iter()
                    .all(|(key, value)| matches(record, key, value))
            })
            .cloned()
            .collect())
    }

    async fn save_record(
        &self,
        token: Option<&str>,
        payload: &SavePayload,
    ) -> Result<RecordId, KcatError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.map(str::to_string));
        let reply = *self.reply.lock().unwrap();
        reply.into_result()?;
        self.saved.lock().unwrap().push(payload.clone());
        let mut records = self.records.lock().unwrap();
        records.push(BackendRecord {
            ec_number: None,
            prot_id: None,
            sub: Some(payload.sub.clone()),
            smiles: Some(payload.smiles.clone()),
            sequences: Some(payload.sequences.clone()),
            temperature: payload.temperature,
            kcat: payload.kcat,
            formatted_kcat: None,
            predicted: Some(payload.predicted),
        });
        Ok(RecordId::Numeric(records.len() as i64))
    }
}

pub struct MockPredictor<I> {
    pub kcat: Option<f64>,
    pub reply: Reply,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    input: PhantomData<fn() -> I>,
}

impl<I> Clone for MockPredictor<I> {
    fn clone(&self) -> Self {
        Self {
            kcat: self.kcat,
            reply: self.reply,
            delay: self.delay,
            calls: Arc::clone(&self.calls),
            input: PhantomData,
        }
    }
}

impl<I> MockPredictor<I> {
    pub fn returning(kcat: Option<f64>) -> Self {
        Self {
            kcat,
            reply: Reply::Ok,
            delay: Duration::ZERO,
            calls: Arc::default(),
            input: PhantomData,
        }
    }

    pub fn failing(reply: Reply) -> Self {
        Self {
            reply,
            ..Self::returning(None)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<I: PredictionInput + 'static> KcatPredictor for MockPredictor<I> {
    type Input = I;

    async fn predict_kcat(&self, _input: &I) -> Result<Option<f64>, KcatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.into_result()?;
        Ok(self.kcat)
    }
}

pub type ModelA = MockPredictor<ModelARequest>;
pub type ModelB = MockPredictor<ModelBRequest>;

/// Known names by SMILES; anything else behaves like a failed lookup.
#[derive(Clone, Default)]
pub struct MockResolver {
    pub names: Arc<HashMap<String, String>>,
    pub calls: Arc<AtomicUsize>,
}

impl MockResolver {
    pub fn knowing(pairs: &[(&str, &str)]) -> Self {
        Self {
            names: Arc::new(
                pairs
                    .iter()
                    .map(|(smiles, name)| (smiles.to_string(), name.to_string()))
                    .collect(),
            ),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameResolver for MockResolver {
    async fn resolve_name(&self, smiles: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.names.get(smiles).cloned()
    }
}

#[derive(Clone, Default)]
pub struct RecordingRedirect {
    pub count: Arc<AtomicUsize>,
}

impl RecordingRedirect {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn logged_in(token: &str) -> SessionStore {
    let session = SessionStore::in_memory();
    session
        .set_session(
            token,
            User {
                id: 1,
                username: "researcher".to_string(),
                email: "researcher@example.org".to_string(),
            },
        )
        .unwrap();
    session
}

pub fn row(ec_number: &str, prot_id: &str, kcat: f64) -> BackendRecord {
    BackendRecord {
        ec_number: Some(ec_number.to_string()),
        prot_id: Some(prot_id.to_string()),
        sub: None,
        smiles: None,
        sequences: None,
        temperature: None,
        kcat,
        formatted_kcat: None,
        predicted: None,
    }
}

pub fn model_a_request() -> ModelARequest {
    ModelARequest {
        substrate_smiles: "CCO".to_string(),
        protein_sequence: "MKTAYIAKQR".to_string(),
    }
}

pub fn model_b_request() -> ModelBRequest {
    ModelBRequest {
        substrate_smiles: "CCO".to_string(),
        protein_sequence: "MKTAYIAKQR".to_string(),
        temperature_celsius: Some(37.0),
    }
}
