pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod opportunities;
pub mod profiles;
pub mod rpc;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
