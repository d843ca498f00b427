#[macro_use]
extern crate lazy_static;

pub mod api;
pub mod catalog;
pub mod extract;
pub mod model;
pub mod poller;
pub mod queue;
pub mod session;
pub mod settings;

pub use api::Error;
pub use poller::Poller;
pub use queue::MetricsQueue;

pub const NAME: &str = "SMAWebConnect";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
