/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// so access control is applied explicitly at the module level (via Axum
/// layers) rather than per handler, preventing accidental exposure of
/// protected endpoints.

/// Routes accessible to all visitors (reading posts, registration, login,
/// static pages, contact). Session-aware handlers in this module decide for
/// themselves what anonymous access means.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware: authoring,
/// editing, and deleting posts. Requires a validated session; anonymous
/// requests are redirected to the login page.
pub mod authenticated;
