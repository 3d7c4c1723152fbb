//! Command modules for the Wing CLI

pub mod facet_cut;
pub mod gogogo;
pub mod selectors;
