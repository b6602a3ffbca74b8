/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// extracting the necessary data, calling the appropriate repository functions,
/// and returning a properly formatted response.

mod category_handlers;
mod health_handlers;
mod note_handlers;
mod snapshot_handlers;
mod user_handlers;

// Re-export all handlers
pub use category_handlers::*;
pub use health_handlers::*;
pub use note_handlers::*;
pub use snapshot_handlers::*;
pub use user_handlers::*;
