//! HTTP front end: routes, configuration, DTOs and error mapping.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;
