//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store)
//! 4. Panic boundary (`CatchPanicLayer`, render failures become 500s)
//! 5. Rate limiting on auth routes (governor)

pub mod panic;
pub mod rate_limit;
pub mod session;

pub use panic::catch_panic_layer;
pub use rate_limit::auth_rate_limiter;
pub use session::create_session_layer;
