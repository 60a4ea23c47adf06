//! Configuration module

mod plugin;
mod site;

pub use plugin::normalize_name;
pub use plugin::PluginDescriptor;
pub use site::Author;
pub use site::MenuItem;
pub use site::SiteConfig;
pub use site::SiteMetadata;
