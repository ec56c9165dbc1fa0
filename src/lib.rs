pub mod batch;
pub mod cli;
pub mod config;
pub mod extract;
pub mod layout;
pub mod report;
pub mod sample_key;
pub mod util;
pub mod writer;
