pub mod admin;
pub mod dto;
pub mod employer;
pub mod orders;
