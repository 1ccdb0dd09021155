pub mod jwt;
pub mod middleware;
pub mod model;

#[cfg(test)]
mod tests;

pub use jwt::*;
pub use middleware::*;
pub use model::*;
