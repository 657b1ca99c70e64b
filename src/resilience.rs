#[path = "resilience/policy.rs"]
mod policy;

#[path = "resilience/retry.rs"]
mod retry;

pub use policy::RetryPolicy;
pub use retry::Retried;
