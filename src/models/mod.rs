pub mod token;
pub mod user;

pub use token::{decode_token, TokenClaims, TokenError};
pub use user::{scopes, UserAccess, UserData};
