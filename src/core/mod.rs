pub mod context;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod route;
pub mod service;
pub mod table;
pub mod validator;

pub use context::{RequestContext, TokenVars};
pub use dispatcher::MockResponse;
pub use error::{LoadError, SchemaError, ValidationError};
pub use route::{RequestSpec, ResponseSpec, RouteData, RouteDefinition, RouteKey};
pub use service::MockService;
pub use table::RouteTable;
pub use validator::PayloadMismatch;
