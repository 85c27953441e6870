//! Persisted state kept between runs

pub mod builtin_cache;

pub use builtin_cache::BuiltinCache;
