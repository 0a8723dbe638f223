pub mod config;
pub mod rpc;
