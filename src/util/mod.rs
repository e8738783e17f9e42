pub mod config;
pub mod log;
pub mod logging;
pub mod middleware;

#[cfg(test)]
pub(crate) mod testing;
