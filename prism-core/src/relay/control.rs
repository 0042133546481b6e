//! Viewer control messages.

use serde::Deserialize;

use crate::error::Error;

/// Settings pushed by the viewer as a JSON object.
///
/// Unknown fields are ignored so UI payloads can carry knobs destined
/// for other components. A message without a `colormap` field is a
/// valid no-op.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerSettings {
    pub colormap: Option<String>,
}

impl ViewerSettings {
    pub fn parse(payload: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(payload)?)
    }
}
