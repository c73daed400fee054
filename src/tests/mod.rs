#[cfg(test)]
pub mod common;

mod http_routes;
