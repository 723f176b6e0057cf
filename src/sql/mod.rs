pub mod expression;
pub mod parser;
pub mod planner;
pub mod runtime;
pub mod session;
pub mod statement;

pub use session::Session;
