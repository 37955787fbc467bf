//! Messages exchanged with the extension host that owns the activation
//! button.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("malformed channel message: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    Toggle,
    GetStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleStatus {
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Toggled { status: ToggleStatus },
    Status {
        #[serde(rename = "isActive")]
        is_active: bool,
    },
}

pub fn parse_request(json: &str) -> Result<Request, ChannelError> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_response(response: &Response) -> Result<String, ChannelError> {
    Ok(serde_json::to_string(response)?)
}

/// Answers the page-load question "should the tool be active here".
pub trait StatusSource {
    fn should_be_active(&self) -> bool;
}

impl StatusSource for bool {
    fn should_be_active(&self) -> bool {
        *self
    }
}
