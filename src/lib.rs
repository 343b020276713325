pub mod clock;
pub mod domain;
pub mod store;
pub mod service;
pub mod telemetry;
pub mod http;

pub use clock::*;
pub use domain::*;
pub use store::*;
pub use service::*;
pub use telemetry::*;
pub use http::*;
