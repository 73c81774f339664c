// handlers/mod.rs - HTTP endpoints
//
// Public pages and tenant pages sit behind the tenant resolver. Everything
// under /api and /health is bypassed by the resolver and handles its own
// authentication.

pub mod auth;
pub mod health;
pub mod public;
pub mod tenant;

pub use health::health;
pub use public::{not_found, public_page};
pub use tenant::tenant_page;
