use serde::Deserialize;

use crate::sessions::repo::SessionStatus;

/// PATCH body for the explicit lifecycle write.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SessionStatus,
}
