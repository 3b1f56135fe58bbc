use std::sync::Arc;

use common::credentials::CredentialStore;
use common::store::JobStore;
use worker::JobExecutor;

use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::extractors::auth::Authorizer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jobs: JobStore,
    pub credentials: CredentialStore,
    pub authorizer: Arc<dyn Authorizer>,
    pub dispatcher: Arc<Dispatcher>,
    /// Executes synchronous actions inline on the submission path.
    pub executor: Arc<JobExecutor>,
}
