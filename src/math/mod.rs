//! Math-related constructs used by the other modules.

mod vec3;

pub use vec3::Vec3;
