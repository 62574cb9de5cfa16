// Week grid calendar core
// Exports all modules for embedding and reuse

pub mod models;
pub mod services;
pub mod utils;
