mod vector;

pub use vector::{DEFAULT_BLOCK_SIZE, ExtVector};
