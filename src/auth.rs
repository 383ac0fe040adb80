use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::KcatError;
use crate::session::SessionStore;

/// Where the user goes after the session is torn down.
pub trait LoginRedirect: Send + Sync + 'static {
    fn redirect_to_login(&self);
}

/// Turns an expired-login error into a delayed logout, leaving time for the
/// error message to be shown first.
pub struct AuthFailureHandler<L: LoginRedirect> {
    session: SessionStore,
    redirect: Arc<L>,
    delay: Duration,
}

impl<L: LoginRedirect> AuthFailureHandler<L> {
    pub fn new(session: SessionStore, redirect: L, delay: Duration) -> Self {
        Self {
            session,
            redirect: Arc::new(redirect),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from inside a tokio runtime.
    pub fn handle(&self, err: &KcatError) -> Option<JoinHandle<()>> {
        if !err.clears_session() {
            return None;
        }
        let session = self.session.clone();
        let redirect = Arc::clone(&self.redirect);
        let delay = self.delay;
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.clear();
            tracing::info!("session expired; cleared and redirecting to login");
            redirect.redirect_to_login();
        }))
    }
}
