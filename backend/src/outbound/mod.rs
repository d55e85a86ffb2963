//! Driven adapters: PostgreSQL stores and the outbound SaaS gateways.

pub mod geocoding;
mod http;
pub mod identity;
pub mod images;
pub mod payments;
pub mod persistence;

pub use geocoding::{MapQuestConfig, MapQuestGeocoder};
pub use identity::{GoogleConfig, GoogleIdentity};
pub use images::{CloudinaryConfig, CloudinaryImageStore};
pub use payments::{StripeConfig, StripeGateway};
