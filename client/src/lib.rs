mod backoff;
mod client;

pub use backoff::*;
pub use client::*;
