pub mod call;
pub mod host;
pub mod receipt;

#[cfg(test)]
mod scenarios;

// Re-export the main types for convenience
pub use call::{Call, CallOutput};
pub use host::Host;
pub use receipt::{CallHash, CallReceipt, HostEvent};
