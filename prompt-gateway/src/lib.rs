pub mod config;
pub mod dtos;
pub mod handlers;
pub mod lifecycle;
pub mod services;
pub mod startup;
