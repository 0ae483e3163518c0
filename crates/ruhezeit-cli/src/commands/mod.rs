pub mod focus;
pub mod helpers;
pub mod organize;
pub mod runtime;
pub mod serve;
pub mod summaries;
pub mod tokens;
