pub mod image_cache;
pub mod overlay;
pub mod slide;
