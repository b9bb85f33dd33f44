//! Project rate-limit resolution and lifecycle.
//!
//! Rate limits cannot be created or deleted on the platform. They exist per
//! model once a project can use that model; this module finds them from loose
//! identifiers, updates them, and resets them to documented defaults in place
//! of deletion.

pub mod defaults;
pub mod error;
pub mod identifier;
pub mod matcher;
pub mod model;
pub mod service;

pub use defaults::{DefaultLimits, DefaultTable};
pub use error::RateLimitError;
pub use identifier::{resolve_identifier, ResolvedIdentifier};
pub use matcher::{find_rate_limit, Match, MatchStrategy};
pub use model::{RateLimit, RateLimitFields, RateLimitPage};
pub use service::{ImportId, RateLimitService};
