use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::job::submit_job,
            handlers::job::list_jobs
        ))
        .routes(routes!(handlers::job::dispatch_worker))
        .routes(routes!(handlers::job::job_status))
        .routes(routes!(
            handlers::credential::set_credential,
            handlers::credential::list_credentials
        ))
}
