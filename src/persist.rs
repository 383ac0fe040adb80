use crate::domain::{PredictionResult, SourceModel};
use crate::enzyme_api::{EnzymeBackend, RecordId, SavePayload};
use crate::error::KcatError;
use crate::pubchem::NameResolver;
use crate::session::SessionStore;

/// Stores a confirmed prediction. Always inserts; the provenance code sent is
/// the one the prediction carries.
#[derive(Clone)]
pub struct PersistenceGateway<B: EnzymeBackend, R: NameResolver> {
    backend: B,
    resolver: R,
    session: SessionStore,
}

impl<B: EnzymeBackend, R: NameResolver> PersistenceGateway<B, R> {
    pub fn new(backend: B, resolver: R, session: SessionStore) -> Self {
        Self {
            backend,
            resolver,
            session,
        }
    }

    pub async fn save(&self, result: &PredictionResult) -> Result<RecordId, KcatError> {
        let kcat = result.kcat_value.ok_or_else(|| {
            KcatError::validation("prediction has no kcat value and cannot be saved")
        })?;

        if !self.session.is_logged_in() {
            return Err(KcatError::AuthExpired);
        }

        let mut substrate_name = result.substrate_name.clone();
        let smiles = result.substrate_smiles.trim();
        if SourceModel::is_placeholder(&substrate_name) && !smiles.is_empty() {
            if let Some(name) = self.resolver.resolve_name(smiles).await {
                substrate_name = name;
            }
        }

        let payload = SavePayload {
            sub: substrate_name,
            smiles: result.substrate_smiles.clone(),
            sequences: result.protein_sequence.clone(),
            kcat,
            temperature: result.temperature_celsius,
            predicted: result.provenance.code(),
        };

        let token = self.session.token().ok_or(KcatError::AuthExpired)?;
        let id = self
            .backend
            .save_record(Some(&token), &payload)
            .await
            .map_err(rejected_payload)?;
        tracing::info!(%id, model = result.model_label(), "prediction saved");
        Ok(id)
    }
}

/// 400 and 422 on save mean the record itself was refused.
fn rejected_payload(err: KcatError) -> KcatError {
    match err {
        KcatError::Upstream {
            status: 400 | 422,
            message,
        } => KcatError::validation(
            message.unwrap_or_else(|| "the database rejected the record".to_string()),
        ),
        other => other,
    }
}
