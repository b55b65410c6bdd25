//! Session authentication core.
//!
//! Credential verification, the session identity codec, the access gate,
//! and the login/logout/register transitions. The identity and session
//! stores are injected trait objects; the core never reaches for global
//! state and never mutates account records.
//!
//! A session holds at most one token, the verified account's email. The
//! token is re-looked-up (not re-verified) on every request; if the
//! account has been deleted the session degrades to anonymous.

mod codec;
pub(crate) mod gate;
mod login;
mod register;
pub(crate) mod session;
mod state;
pub(crate) mod storage;
mod types;
mod verifier;

pub use session::{MemorySessionStore, SessionState, SessionStore};
pub use state::{AppConfig, AuthState};
pub use storage::{CreateOutcome, Identity, IdentityStore, MemoryIdentityStore, PgIdentityStore};

pub(crate) use login::{login, login_form, logout};
pub(crate) use register::{register, register_form};
