//! Domain models for the storefront.
//!
//! These are the records persisted in browser storage and exchanged with the
//! catalog API. Field names on the wire are camelCase to stay compatible with
//! what the storefront has always written.

pub mod cart;
pub mod catalog;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLineItem, Variations};
pub use catalog::{CatalogEntry, Rating};
pub use session::CurrentUser;
pub use user::UserRecord;
