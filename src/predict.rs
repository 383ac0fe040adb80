//! Prediction pipeline shared by both inference backends.
//!
//! Each backend only knows how to turn its request into a kcat value; the
//! validate → name → predict → normalize sequence is common.

use async_trait::async_trait;

use crate::domain::{ModelARequest, ModelBRequest, PredictionInput, PredictionResult};
use crate::error::KcatError;
use crate::pubchem::NameResolver;

/// One inference service. `Ok(None)` means the reply carried no numeric kcat.
#[async_trait]
pub trait KcatPredictor: Send + Sync {
    type Input: PredictionInput;

    async fn predict_kcat(&self, input: &Self::Input) -> Result<Option<f64>, KcatError>;
}

pub async fn run_prediction<P, R>(
    predictor: &P,
    resolver: &R,
    input: &P::Input,
) -> Result<PredictionResult, KcatError>
where
    P: KcatPredictor,
    R: NameResolver,
{
    input.validate()?;
    let model = input.source_model();

    let substrate_name = resolver
        .resolve_name(input.substrate_smiles())
        .await
        .unwrap_or_else(|| model.placeholder_name().to_string());

    let kcat = predictor.predict_kcat(input).await.inspect_err(|err| {
        tracing::warn!(model = model.label(), %err, "prediction failed");
    })?;
    if kcat.is_none() {
        tracing::warn!(model = model.label(), "prediction reply had no kcat value");
    }

    Ok(PredictionResult::new(input, substrate_name, kcat))
}

#[derive(Clone)]
pub struct PredictionService<A, B, R>
where
    A: KcatPredictor<Input = ModelARequest>,
    B: KcatPredictor<Input = ModelBRequest>,
    R: NameResolver,
{
    model_a: A,
    model_b: B,
    resolver: R,
}

impl<A, B, R> PredictionService<A, B, R>
where
    A: KcatPredictor<Input = ModelARequest>,
    B: KcatPredictor<Input = ModelBRequest>,
    R: NameResolver,
{
    pub fn new(model_a: A, model_b: B, resolver: R) -> Self {
        Self {
            model_a,
            model_b,
            resolver,
        }
    }

    pub async fn predict_model_a(
        &self,
        request: &ModelARequest,
    ) -> Result<PredictionResult, KcatError> {
        run_prediction(&self.model_a, &self.resolver, request).await
    }

    pub async fn predict_model_b(
        &self,
        request: &ModelBRequest,
    ) -> Result<PredictionResult, KcatError> {
        run_prediction(&self.model_b, &self.resolver, request).await
    }

    /// Runs both pipelines concurrently; neither outcome affects the other.
    pub async fn predict_both(
        &self,
        model_a: &ModelARequest,
        model_b: &ModelBRequest,
    ) -> (
        Result<PredictionResult, KcatError>,
        Result<PredictionResult, KcatError>,
    ) {
        tokio::join!(self.predict_model_a(model_a), self.predict_model_b(model_b))
    }
}
