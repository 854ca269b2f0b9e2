//! Individual crop and enhancement steps

pub mod brightness;
pub mod contrast;
pub mod crop;
pub mod grayscale;
pub mod normalize;
