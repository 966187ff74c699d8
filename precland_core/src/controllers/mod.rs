// precland_core/src/controllers/mod.rs

pub mod landing;
pub mod search;
