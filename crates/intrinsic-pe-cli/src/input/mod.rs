pub mod file;
pub mod provider;
pub mod stdin;
