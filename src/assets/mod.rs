/// Base image decoding.
pub mod decode;
