use crate::domain::{EnzymeRecord, QueryFilter};
use crate::enzyme_api::EnzymeBackend;
use crate::error::KcatError;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct QueryService<B: EnzymeBackend> {
    backend: B,
    session: SessionStore,
}

impl<B: EnzymeBackend> QueryService<B> {
    pub fn new(backend: B, session: SessionStore) -> Self {
        Self { backend, session }
    }

    /// Rejects an empty filter before any I/O; zero matches is `Ok(vec![])`.
    pub async fn search(&self, filter: &QueryFilter) -> Result<Vec<EnzymeRecord>, KcatError> {
        filter.validate()?;
        let token = self.session.token();
        let rows = self.backend.find_kcat(token.as_deref(), filter).await?;
        tracing::debug!(count = rows.len(), "search returned records");
        Ok(rows.into_iter().map(EnzymeRecord::from).collect())
    }
}
