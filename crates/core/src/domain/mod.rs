pub mod alert;
pub mod client;
pub mod session;
