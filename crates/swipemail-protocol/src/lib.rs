pub mod client;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use types::{
    ActionResponse, AuthStatusResponse, AuthUrlResponse, DraftRecord, DraftsResponse,
    ErrorResponse, FlagRequest, SuccessResponse,
};

/// Name of the cookie carrying the gateway session id.
pub const SESSION_COOKIE: &str = "swipemail_session";
