//! Parallel fan-out of model-inference workloads.
//!
//! A workload is split into batches ([`partition`]), each batch runs in its
//! own task against every configured model endpoint ([`dispatch`]), every
//! response is checked against a [`validation::ResponseContract`], and the
//! resulting [`trace::Trace`]s are merged into per-model statistics once all
//! tasks finish ([`aggregate`]). [`run::EvalRun`] wires the stages together.

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod partition;
pub mod resilience;
pub mod run;
pub mod trace;
pub mod validation;

pub use aggregate::{merge, AggregatedResult, ModelStats};
pub use config::EvalConfig;
pub use dispatch::{fan_out, Dispatcher, RequestShaper};
pub use endpoint::{EndpointRegistry, HttpEndpoint, ModelEndpoint};
pub use error::{ContractViolation, ErrorKind, FanoutError};
pub use partition::{partition, Batch, Partition};
pub use resilience::RetryPolicy;
pub use run::{EvalRun, EvalRunBuilder, RunReport};
pub use trace::Trace;
pub use validation::{validate, ResponseContract};
