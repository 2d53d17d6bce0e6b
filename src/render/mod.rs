//! Raster surfaces that draw captions over a base image.

pub mod composite;
/// CPU surface backed by parley and vello_cpu.
pub mod cpu;
pub mod surface;
