pub mod completion;
pub mod config;
pub mod counter;
pub mod slides;
