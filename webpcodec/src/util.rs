//! Test helpers for crafting WebP files.

pub mod test;
