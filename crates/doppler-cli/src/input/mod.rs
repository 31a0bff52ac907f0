pub mod file;
pub mod listing;
pub mod stdin;
