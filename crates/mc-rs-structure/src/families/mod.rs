//! Structure families: catalogs, child rules, paint and persisted state.

pub mod corridor_tree;
pub mod desert_pyramid;
pub mod end_city;
pub mod fortress;
pub mod mansion;
pub mod mineshaft;
pub mod monument;
pub mod stronghold;
