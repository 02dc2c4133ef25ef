//! Server frame parsing

mod parser;

pub use parser::parse_server_message;
