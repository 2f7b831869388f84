//! The payload side of a table. Labels live in `crate::labels`.

pub mod matrix;

pub use self::matrix::{DataMatrix, Operand, Reduction};
