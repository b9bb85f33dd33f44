pub mod cli;
pub mod config;
pub mod http;
pub mod mcp;
pub mod ratelimit;
pub mod server;
pub mod tools;
