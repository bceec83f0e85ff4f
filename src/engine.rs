mod progress;
mod push;

pub use progress::PushContext;
pub use push::PushEngine;
