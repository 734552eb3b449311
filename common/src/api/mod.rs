// Wire types of the network provider API (JSON, camelCase)

mod network;
mod query;
mod transaction;

pub use network::*;
pub use query::*;
pub use transaction::*;

use serde::{Deserialize, Serialize};

/// Envelope wrapping every proxy response
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: String,
}

impl<T> ApiResponse<T> {
    pub const CODE_SUCCESSFUL: &'static str = "successful";

    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: String::new(),
            code: Self::CODE_SUCCESSFUL.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_empty() && self.code == Self::CODE_SUCCESSFUL
    }
}
