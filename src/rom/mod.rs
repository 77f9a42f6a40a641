//! ROM-level components: header analysis (C1), interleaving (C2), and
//! hardware capacity validation (C3).

pub mod interleave;
pub mod reader;
pub mod validate;

pub use interleave::interleave;
pub use reader::{analyze_rom, RomType, SnesRom};
pub use validate::validate_hardware_capacity;
