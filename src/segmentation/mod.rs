pub mod compress;

pub use compress::{compress, segment_to_item};
