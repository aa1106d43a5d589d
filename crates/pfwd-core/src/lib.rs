pub mod config;
pub mod logging;

pub mod entity;
pub mod events;
pub mod forward;
pub mod forwarder;
pub mod page;
pub mod request;
pub mod session;
pub mod settings;
pub mod store;
