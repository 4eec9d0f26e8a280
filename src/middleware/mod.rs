pub mod auth;

pub use auth::{authenticate, extract_bearer_token, CurrentUser, Gateway, USER_ID_HEADER};
