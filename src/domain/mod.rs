pub mod errors;
pub mod events;
pub mod geo;
pub mod notification;
pub mod order;
pub mod outbox;
pub mod ports;
pub mod status;
