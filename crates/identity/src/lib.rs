//! Participant identity and access control.
//!
//! Owns `User` records and their status lifecycle. Users are created through
//! self-registration (pending approval) or administratively (pre-approved),
//! and are never deleted; the only mutation is a status transition along a
//! fixed graph.

pub mod registry;
pub mod user;

pub use registry::{IdentityEvent, IdentityRegistry, UserAdded, UserStatusUpdated};
pub use user::{Role, User, UserStatus};
