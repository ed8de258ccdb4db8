mod canvas;
mod client_replica;
mod message;
mod registry;
mod traits;
mod types;

pub use canvas::*;
pub use client_replica::*;
pub use message::*;
pub use registry::*;
pub use traits::*;
pub use types::*;

pub use serde;
pub use serde_json;
pub use uuid;
