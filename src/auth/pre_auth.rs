use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockListError {
    #[error("Blocked user entry '{entry}' has no reason")]
    MissingReason { entry: String },

    #[error("Blocked user entry '{entry}' is incomplete")]
    Incomplete { entry: String },
}

/// Sign-in refusal returned to the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreAuthenticationError {
    #[error("This user is blocked. Reason: {reason}")]
    Blocked { reason: String },
}

/// Users refused at sign-in, keyed by lowercased email
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    entries: HashMap<String, String>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, email: &str, reason: impl Into<String>) -> Self {
        self.entries
            .insert(email.trim().to_lowercase(), reason.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reason_for(&self, email: &str) -> Option<&str> {
        self.entries
            .get(&email.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Message returned to a blocked user, `None` when the user may proceed
    pub fn rejection(&self, email: &str) -> Option<String> {
        self.refusal(email).map(|refusal| refusal.to_string())
    }

    fn refusal(&self, email: &str) -> Option<PreAuthenticationError> {
        self.reason_for(email)
            .map(|reason| PreAuthenticationError::Blocked {
                reason: reason.to_string(),
            })
    }

    /// Pre-authentication trigger: hand the event back unchanged or refuse sign-in
    pub fn pre_authenticate(
        &self,
        event: PreAuthenticationEvent,
    ) -> Result<PreAuthenticationEvent, PreAuthenticationError> {
        let refusal = event
            .request
            .user_attributes
            .get("email")
            .and_then(|email| self.refusal(email));

        match refusal {
            Some(refusal) => {
                warn!(user_name = ?event.user_name, "Sign-in refused for blocked user");
                Err(refusal)
            }
            None => {
                info!(user_name = ?event.user_name, "Pre-authentication passed");
                Ok(event)
            }
        }
    }
}

impl FromStr for BlockList {
    type Err = BlockListError;

    /// Parse `email=REASON` pairs separated by commas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut list = BlockList::new();

        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (email, reason) = entry
                .split_once('=')
                .ok_or_else(|| BlockListError::MissingReason {
                    entry: entry.to_string(),
                })?;

            if email.trim().is_empty() || reason.trim().is_empty() {
                return Err(BlockListError::Incomplete {
                    entry: entry.to_string(),
                });
            }

            list = list.block(email, reason.trim());
        }

        Ok(list)
    }
}

/// Identity-provider event raised before a user is allowed to sign in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreAuthenticationEvent {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_pool_id: Option<String>,
    pub request: PreAuthenticationRequest,
    #[serde(default)]
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreAuthenticationRequest {
    #[serde(default)]
    pub user_attributes: HashMap<String, String>,
}
