//! Library fixture compiled from `sluice.json` by the build script.

pub mod dao;
pub mod model;

mod generated {
    use crate::model::*;

    include!(concat!(env!("OUT_DIR"), "/sluice.rs"));
}

pub use generated::*;
