// Auth module - access policy and pre-authentication checks

pub mod policy;
pub mod pre_auth;

pub use policy::{AccessPolicy, AccessTier, Credential, Scope};
pub use pre_auth::{
    BlockList, BlockListError, PreAuthenticationError, PreAuthenticationEvent,
    PreAuthenticationRequest,
};
