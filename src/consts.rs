// Floating point comparisons and surface offsets
pub const EPSILON: f64 = 0.00001;

// Maximum recursion depth for reflected and refracted rays
pub const DEFAULT_MAX_DEPTH: usize = 5;

// Groups with more children than this are subdivided by default
pub const DEFAULT_BVH_THRESHOLD: usize = 4;

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.5;
