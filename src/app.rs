use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::aggregate::{DisplayRecord, merge};
use crate::auth::{AuthFailureHandler, LoginRedirect};
use crate::domain::{
    EnzymeRecord, ModelARequest, ModelBRequest, PredictionResult, QueryFilter, SourceModel,
};
use crate::enzyme_api::{EnzymeBackend, RecordId};
use crate::error::{KcatError, Operation};
use crate::persist::PersistenceGateway;
use crate::predict::{KcatPredictor, PredictionService};
use crate::pubchem::NameResolver;
use crate::query::QueryService;
use crate::session::SessionStore;

/// Observable state of one user action.
#[derive(Debug, Clone, Serialize)]
pub struct SlotState<T> {
    pub in_progress: bool,
    pub error: Option<String>,
    pub results: Vec<T>,
}

impl<T> Default for SlotState<T> {
    fn default() -> Self {
        Self {
            in_progress: false,
            error: None,
            results: Vec::new(),
        }
    }
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
        }
    }

    fn with<V>(&self, f: impl FnOnce(&mut SlotState<T>) -> V) -> V {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn begin(&self) -> BusyGuard<'_, T> {
        self.with(|state| {
            state.in_progress = true;
            state.error = None;
        });
        BusyGuard { slot: self }
    }

    fn snapshot(&self) -> SlotState<T> {
        self.with(|state| state.clone())
    }
}

/// Resets `in_progress` however the operation exits.
struct BusyGuard<'a, T> {
    slot: &'a Slot<T>,
}

impl<T> Drop for BusyGuard<'_, T> {
    fn drop(&mut self) {
        let mut guard = self
            .slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.in_progress = false;
    }
}

/// Presentation-facing façade: one slot per user action, results merged on
/// demand, and the expired-login teardown scheduled here.
pub struct Workbench<B, A, M, R, L>
where
    B: EnzymeBackend + Clone,
    A: KcatPredictor<Input = ModelARequest>,
    M: KcatPredictor<Input = ModelBRequest>,
    R: NameResolver + Clone,
    L: LoginRedirect,
{
    session: SessionStore,
    query: QueryService<B>,
    prediction: PredictionService<A, M, R>,
    persistence: PersistenceGateway<B, R>,
    auth: AuthFailureHandler<L>,
    search_slot: Slot<EnzymeRecord>,
    model_a_slot: Slot<PredictionResult>,
    model_b_slot: Slot<PredictionResult>,
    save_slot: Slot<RecordId>,
    teardown: Mutex<Option<JoinHandle<()>>>,
}

impl<B, A, M, R, L> Workbench<B, A, M, R, L>
where
    B: EnzymeBackend + Clone,
    A: KcatPredictor<Input = ModelARequest>,
    M: KcatPredictor<Input = ModelBRequest>,
    R: NameResolver + Clone,
    L: LoginRedirect,
{
    pub fn new(
        session: SessionStore,
        backend: B,
        model_a: A,
        model_b: M,
        resolver: R,
        redirect: L,
        redirect_delay: Duration,
    ) -> Self {
        Self {
            query: QueryService::new(backend.clone(), session.clone()),
            prediction: PredictionService::new(model_a, model_b, resolver.clone()),
            persistence: PersistenceGateway::new(backend, resolver, session.clone()),
            auth: AuthFailureHandler::new(session.clone(), redirect, redirect_delay),
            session,
            search_slot: Slot::new(),
            model_a_slot: Slot::new(),
            model_b_slot: Slot::new(),
            save_slot: Slot::new(),
            teardown: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn search(&self, filter: &QueryFilter) -> Result<Vec<EnzymeRecord>, KcatError> {
        let _busy = self.search_slot.begin();
        let outcome = self.query.search(filter).await;
        self.settle(&self.search_slot, Operation::Search, outcome, |records| {
            records.clone()
        })
    }

    pub async fn predict_model_a(
        &self,
        request: &ModelARequest,
    ) -> Result<PredictionResult, KcatError> {
        let _busy = self.model_a_slot.begin();
        let outcome = self.prediction.predict_model_a(request).await;
        self.settle(&self.model_a_slot, Operation::Predict, outcome, |result| {
            vec![result.clone()]
        })
    }

    pub async fn predict_model_b(
        &self,
        request: &ModelBRequest,
    ) -> Result<PredictionResult, KcatError> {
        let _busy = self.model_b_slot.begin();
        let outcome = self.prediction.predict_model_b(request).await;
        self.settle(&self.model_b_slot, Operation::Predict, outcome, |result| {
            vec![result.clone()]
        })
    }

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

    /// Saves the current result of `model`'s slot.
    pub async fn save(&self, model: SourceModel) -> Result<RecordId, KcatError> {
        let _busy = self.save_slot.begin();
        let outcome = match self.prediction_state(model).results.into_iter().next() {
            Some(result) => self.persistence.save(&result).await,
            None => Err(KcatError::validation(format!(
                "no {} prediction to save",
                model.label()
            ))),
        };
        self.settle(&self.save_slot, Operation::Save, outcome, |id| vec![id.clone()])
    }

    pub fn search_state(&self) -> SlotState<EnzymeRecord> {
        self.search_slot.snapshot()
    }

    pub fn prediction_state(&self, model: SourceModel) -> SlotState<PredictionResult> {
        match model {
            SourceModel::A => self.model_a_slot.snapshot(),
            SourceModel::B => self.model_b_slot.snapshot(),
        }
    }

    pub fn save_state(&self) -> SlotState<RecordId> {
        self.save_slot.snapshot()
    }

    pub fn display_records(&self) -> Vec<DisplayRecord> {
        merge(
            &self.search_slot.snapshot().results,
            &self.model_a_slot.snapshot().results,
            &self.model_b_slot.snapshot().results,
        )
    }

    /// Waits for a scheduled expired-login teardown, if any.
    pub async fn wait_for_teardown(&self) {
        let handle = self
            .teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(%err, "session teardown task failed");
            }
        }
    }

    pub fn teardown_pending(&self) -> bool {
        self.teardown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn settle<T, S: Clone>(
        &self,
        slot: &Slot<S>,
        operation: Operation,
        outcome: Result<T, KcatError>,
        to_results: impl FnOnce(&T) -> Vec<S>,
    ) -> Result<T, KcatError> {
        match outcome {
            Ok(value) => {
                let results = to_results(&value);
                slot.with(|state| state.results = results);
                Ok(value)
            }
            Err(err) => {
                let message = err.user_message(operation);
                // Input mistakes leave the previous results on screen.
                let keep_results = matches!(err, KcatError::Validation { .. });
                slot.with(|state| {
                    state.error = Some(message);
                    if !keep_results {
                        state.results.clear();
                    }
                });
                self.schedule_teardown(&err);
                Err(err)
            }
        }
    }

    fn schedule_teardown(&self, err: &KcatError) {
        if self.teardown_pending() {
            return;
        }
        if let Some(handle) = self.auth.handle(err) {
            *self.teardown.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        }
    }
}
