pub mod client;
pub mod evaluate;
pub mod parser;
pub mod poller;
