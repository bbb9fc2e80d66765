//! HTTP request handlers.

pub mod audit_log;
pub mod health;
pub mod leads;
pub mod members;
pub mod notifications;
pub mod staff;

use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

/// Optional branch filter shared by the list surfaces.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BranchQuery {
    pub branch_id: Option<Uuid>,
}
