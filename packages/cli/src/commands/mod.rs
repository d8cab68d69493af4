pub mod compose;
pub mod init;

pub use compose::{compose, ComposeArgs};
pub use init::{init, InitArgs};
