pub mod client_listener;
pub mod control_client;
pub mod control_listener;

pub use client_listener::ClientListener;
pub use control_client::ControlUpdate;
pub use control_listener::ControlListener;
