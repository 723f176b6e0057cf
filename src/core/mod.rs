pub mod codec;
pub mod datum;
pub mod error;
pub mod tuple;
pub mod types;

pub use datum::*;
pub use error::*;
pub use tuple::*;
pub use types::*;
