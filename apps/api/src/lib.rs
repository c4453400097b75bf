pub mod config;
pub mod errors;
pub mod form;
pub mod outcome;
pub mod relay;
pub mod routes;
pub mod state;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;
