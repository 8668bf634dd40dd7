pub mod controller;
pub mod events;
pub mod request;

pub use controller::TimeLockedController;
pub use events::ControllerEvent;
pub use request::MintRequest;
