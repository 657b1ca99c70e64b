#[path = "endpoint/traits.rs"]
mod traits;

#[path = "endpoint/registry.rs"]
mod registry;

#[path = "endpoint/http.rs"]
mod http;

#[cfg(test)]
#[path = "endpoint/http_tests.rs"]
mod http_tests;

pub use http::HttpEndpoint;
pub use registry::{EndpointRegistry, EndpointRegistryBuilder, ModelId};
pub use traits::ModelEndpoint;
