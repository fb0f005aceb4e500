//! Resource-service side of the permission protocol.
//!
//! A resource service protects its routes by asking the auth service (over
//! HTTP with [`AuthServiceClient`], or in-process with [`LocalChecker`])
//! whether the caller's application key and user token may use a
//! `(resource, sub-resource)` pair, then merging both answers with
//! [`authenticate_request`].
//!
//! ```ignore
//! let checker: Arc<dyn PermissionChecker> = Arc::new(AuthServiceClient::new(&GuardConfig::from_env())?);
//! let app = Router::new()
//!     .route("/bins", get(list_bins))
//!     .layer(from_fn_with_state(
//!         GuardState::new(checker, "waste-services", "bin"),
//!         middleware::guard,
//!     ));
//! ```

pub mod authenticate;
pub mod checker;
pub mod client;
pub mod config;
pub mod error;
pub mod local;
pub mod middleware;

pub use authenticate::{authenticate_request, require_user, AuthContext, Credentials, Target};
pub use checker::{PermissionChecker, UserPermissionRequest};
pub use client::AuthServiceClient;
pub use config::GuardConfig;
pub use error::GuardError;
pub use local::LocalChecker;
pub use middleware::{GuardState, RequireUser};
