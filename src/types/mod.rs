//! Data model: values, entities, requests, and decision surfaces.
//!
//! Canonical string forms:
//! - Entity UID: `User::"alice"` or `App::User::"alice"`
//! - Decision: `allow` / `deny`
//! - IP prefix: `10.1.2.3` (single address) or `10.0.0.0/8`
//! - Decimal: `12.34` (trailing zeros trimmed, at least one fractional digit)

mod decimal;
mod decision;
mod entities;
mod entity_uid;
mod ipaddr;
mod pattern;
mod request;
mod value;

pub use decimal::{Decimal, ParseDecimalError};
pub use decision::{Decision, Diagnostic, PolicyError, Reason, Response};
pub use entities::{Entities, Entity};
pub use entity_uid::EntityUID;
pub use ipaddr::{IPAddr, ParseIPAddrError};
pub use pattern::{Pattern, Segment};
pub use request::Request;
pub use value::{Record, Set, Value};
