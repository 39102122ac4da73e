//! Encrypted local storage for the trained state and scored events.

mod encrypted;

pub use encrypted::SecureStore;
