pub mod routes;
pub mod handlers;
pub mod types;
pub mod extractors;

pub use routes::*;
pub use handlers::*;
pub use types::*;
pub use extractors::*;
