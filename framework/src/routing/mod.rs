mod router;
mod template;

pub use router::{BoxedHandler, RouteError, Router};
pub use template::{RouteTemplate, RouteTemplateError, RouteValues};
