pub mod account;
pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod ledger;
pub mod quote;
pub mod req;
pub mod server;
pub mod trade;
pub mod utils;
