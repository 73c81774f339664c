//! Tenant resolution.
//!
//! Every request is mapped to at most one tenant (law firm). The tenant is
//! named by the leftmost host label (`acme.casestream.com`), and inside the
//! router by the `/tenant/{slug}` path prefix. [`TenantResolver`] decides,
//! for a host, a path and the caller's principal, whether the request passes
//! through unchanged, is rewritten into the tenant's path space, or is
//! redirected.

pub mod directory;
pub mod host;
pub mod resolver;
pub mod routes;
pub mod slug;
pub mod url;

pub use directory::{
    check_slug_availability, AccountDirectory, AvailabilityError, DirectoryError,
    InMemoryAccountDirectory, SlugAvailability,
};
pub use host::HostKind;
pub use resolver::{DecisionReason, RequestFacts, Resolution, RoutingDecision, TenantResolver};
pub use routes::{PathClass, RouteTable};
pub use slug::{SlugError, TenantSlug};
pub use self::url::{TenantTarget, TenantUrlBuilder, TenantUrlError};
