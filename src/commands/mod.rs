//! Subcommand implementations

mod grammars;
mod mine;
mod split;

pub use grammars::list_grammars;
pub use mine::{mine, MineArgs};
pub use split::{split, SplitArgs};
