//! Configuration infrastructure module

mod xdg;

pub use xdg::{default_storage_dir, XdgConfigStore};
