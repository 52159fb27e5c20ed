mod connection_table;

pub use connection_table::*;
