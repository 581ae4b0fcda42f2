pub mod dispatcher;
pub mod errors;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod transport;

pub use startup::{load_config, run, run_until};
