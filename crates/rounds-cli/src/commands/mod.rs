pub mod config;
pub mod routine;
pub mod run;
