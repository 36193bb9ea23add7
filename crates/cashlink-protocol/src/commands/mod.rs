//! Command constructors for the two device protocols.
//!
//! These modules name the operations the drivers actually issue; the full
//! scanner configuration catalog is deliberately not enumerated here; menu
//! entries are data, built by callers with [`crate::MenuCommand`].

pub mod acceptor;
pub mod scanner;
