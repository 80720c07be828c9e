//! Email/password identity backing the client session.

mod store;

pub use store::{AuthError, AuthSession, AuthStore, UserSummary};
