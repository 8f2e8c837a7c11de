//! different utility modules used throughout the project
/// solver settings read from TOML
pub mod config;
/// terminal logger initialisation and saving of sampled solutions into file
pub mod logger;
