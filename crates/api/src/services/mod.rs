//! External-service clients.

pub mod email;

pub use email::EmailNotifier;
