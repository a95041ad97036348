#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Sidecar artifacts for signed packages
//!
//! A signed package ships two files next to its directory: `<name>.sig`
//! holding the signature text over the package's tree digest, and
//! `<name>.pub` holding a verbatim copy of the PEM public key. This crate
//! writes them at packaging time and checks them at install or audit time.

mod check;
mod layout;
mod write;

pub use check::verify_sidecars;
pub use layout::{
    default_out_dir, ensure_outside_tree, package_name, SidecarLayout, SidecarPaths,
};
pub use write::{write_sidecars, SidecarReport, SidecarRequest};
