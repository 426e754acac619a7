//! Where article records come from.
//!
//! - [`newsapi`]: live news search
//! - [`csv_input`]: a `URL,Title,Description,Content` CSV file, such as the
//!   search export written by an earlier run

pub mod csv_input;
pub mod newsapi;
