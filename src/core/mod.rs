pub mod balance;
pub mod errors;
pub mod fee;
pub mod models;
pub mod services;
pub mod state_machine;
pub mod validator;
