pub mod error;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod windows;
pub mod zone;
