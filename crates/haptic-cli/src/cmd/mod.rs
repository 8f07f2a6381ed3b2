pub mod config;
pub mod parse;
pub mod patterns;
pub mod play;
pub mod replay;
pub mod serve;
