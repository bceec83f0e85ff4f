mod builder;
mod node;

pub use builder::ManifestBuilder;
pub use node::ManifestNode;
