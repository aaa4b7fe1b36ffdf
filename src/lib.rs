pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

#[cfg(test)]
mod tests;
