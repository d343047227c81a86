pub mod auth;
pub mod logout;
pub mod token;
