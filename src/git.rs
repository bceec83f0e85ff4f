mod cli;
mod links;
mod object;
mod traits;

pub use cli::GitCli;
pub use links::links;
pub use object::{ObjectId, TypedObject};
pub use traits::{ObjectStore, RefTarget, Reference};
