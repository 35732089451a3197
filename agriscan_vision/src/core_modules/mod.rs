pub mod fifo_cache;
pub mod field_zones;
pub mod health_scorer;
pub mod pest_detection;
pub mod pixel;
pub mod pixel_image;
pub mod utils;
pub mod vegetation_index;
pub mod yield_prediction;
