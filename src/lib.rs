pub mod geo;
pub mod location;
pub mod logging;
pub mod server;
