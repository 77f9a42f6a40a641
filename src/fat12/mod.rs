//! FAT12 filesystem components: the BIOS Parameter Block layout (shared),
//! the blank-template factory (C9), and the image writer (C6).

pub mod bpb;
pub mod image;
pub mod template;

pub use bpb::{FloppyType, Geometry};
pub use image::Fat12Writer;
pub use template::create_blank_disk;
