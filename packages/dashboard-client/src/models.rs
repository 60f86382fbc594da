//! Dashboard request and response bodies

use serde::{Deserialize, Serialize};

/// Body of every failed dashboard call
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SeekRequest {
    pub position: f64,
}

/// Acknowledgement returned by player commands
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub ok: bool,

    #[serde(default)]
    pub message: Option<String>,
}
