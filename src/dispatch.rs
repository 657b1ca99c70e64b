#[path = "dispatch/shaper.rs"]
mod shaper;

#[path = "dispatch/dispatcher.rs"]
mod dispatcher;

#[path = "dispatch/pool.rs"]
mod pool;


pub use dispatcher::Dispatcher;
pub use pool::fan_out;
pub use shaper::{BatchRequestFn, ItemRequestFn, RequestShaper};
