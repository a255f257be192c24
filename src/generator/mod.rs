//! Generator implementations

mod builder;
mod glm;
pub mod routing;

pub use builder::{AdapterConfig, Bifrost, DEFAULT_MODEL};
pub use glm::GlmContentGenerator;
pub use routing::{AuthMode, SearchRoute, route_web_search, vendor_search_tool};
