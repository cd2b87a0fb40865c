//! Library components of the `csvy` command line tool.

pub mod commands;
pub mod logging;
