pub mod classify;
pub mod results;
