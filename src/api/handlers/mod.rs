pub mod articles;
pub mod auth;

pub mod health;
pub use self::health::health;

pub(crate) mod root;
pub(crate) mod theme;
