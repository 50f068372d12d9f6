//! The services of a Chatkit instance

mod authorizer;
mod core;
mod cursors;

pub use self::core::CoreService;
pub use authorizer::AuthorizerService;
pub use cursors::CursorsService;

/// Service name of users, rooms, and messages
pub const CORE_SERVICE: &str = "chatkit";

/// Service name of roles and permissions
pub const AUTHORIZER_SERVICE: &str = "chatkit_authorizer";

/// Service name of read cursors
pub const CURSORS_SERVICE: &str = "chatkit_cursors";
