pub mod encoder;

pub use encoder::{inner_product, TextEncoder};
