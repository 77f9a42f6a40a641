//! FAT12 BIOS Parameter Block layout shared by the template factory (C9)
//! and the image writer (C6).

pub const BYTES_PER_SECTOR: usize = 512;
const RESERVED_SECTORS: u16 = 1;
const FAT_COPIES: u8 = 2;

/// The three floppy capacities this crate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloppyType {
    F720K,
    F144M,
    F160M,
}

impl FloppyType {
    pub fn capacity_bytes(self) -> usize {
        match self {
            FloppyType::F720K => 737_280,
            FloppyType::F144M => 1_474_560,
            FloppyType::F160M => 1_638_400,
        }
    }

    pub fn sectors_per_cluster(self) -> u8 {
        match self {
            FloppyType::F720K => 2,
            FloppyType::F144M | FloppyType::F160M => 1,
        }
    }

    pub fn root_dir_entries(self) -> u16 {
        match self {
            FloppyType::F720K => 112,
            FloppyType::F144M | FloppyType::F160M => 224,
        }
    }

    pub fn sectors_per_fat(self) -> u16 {
        match self {
            FloppyType::F720K => 3,
            FloppyType::F144M | FloppyType::F160M => 9,
        }
    }

    pub fn total_sectors(self) -> u32 {
        (self.capacity_bytes() / BYTES_PER_SECTOR) as u32
    }

    /// Smallest floppy type (in the fixed F720K < F144M < F160M capacity
    /// order) whose capacity is at least `bytes`.
    pub fn smallest_fit(bytes: usize) -> Option<FloppyType> {
        [FloppyType::F720K, FloppyType::F144M, FloppyType::F160M]
            .into_iter()
            .find(|f| f.capacity_bytes() >= bytes)
    }
}

/// Geometry derived once from a [`FloppyType`], shared by the writer.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub floppy_type: FloppyType,
    pub fat_start_sector: u32,
    pub root_dir_start_sector: u32,
    pub root_dir_sectors: u32,
    pub data_start_sector: u32,
    pub bytes_per_cluster: usize,
    pub total_clusters: u32,
}

impl Geometry {
    pub fn for_type(floppy_type: FloppyType) -> Geometry {
        let fat_start_sector = RESERVED_SECTORS as u32;
        let root_dir_start_sector =
            fat_start_sector + FAT_COPIES as u32 * floppy_type.sectors_per_fat() as u32;
        let root_dir_sectors = (floppy_type.root_dir_entries() as u32 * 32)
            .div_ceil(BYTES_PER_SECTOR as u32);
        let data_start_sector = root_dir_start_sector + root_dir_sectors;
        let bytes_per_cluster = floppy_type.sectors_per_cluster() as usize * BYTES_PER_SECTOR;
        let data_sectors = floppy_type.total_sectors() - data_start_sector;
        let total_clusters = data_sectors / floppy_type.sectors_per_cluster() as u32;

        Geometry {
            floppy_type,
            fat_start_sector,
            root_dir_start_sector,
            root_dir_sectors,
            data_start_sector,
            bytes_per_cluster,
            total_clusters,
        }
    }
}

/// Writes a valid boot sector (BPB) for `floppy_type` into the first 512
/// bytes of `image`.
pub fn write_bpb(image: &mut [u8], floppy_type: FloppyType) {
    image[0] = 0xEB;
    image[1] = 0x3C;
    image[2] = 0x90;
    image[3..11].copy_from_slice(b"SFFDISK ");
    image[11..13].copy_from_slice(&(BYTES_PER_SECTOR as u16).to_le_bytes());
    image[13] = floppy_type.sectors_per_cluster();
    image[14..16].copy_from_slice(&RESERVED_SECTORS.to_le_bytes());
    image[16] = FAT_COPIES;
    image[17..19].copy_from_slice(&floppy_type.root_dir_entries().to_le_bytes());
    image[19..21].copy_from_slice(&(floppy_type.total_sectors() as u16).to_le_bytes());
    image[21] = 0xF0;
    image[22..24].copy_from_slice(&floppy_type.sectors_per_fat().to_le_bytes());
    image[510] = 0x55;
    image[511] = 0xAA;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_fit_picks_the_first_capacity_that_holds_bytes() {
        assert_eq!(FloppyType::smallest_fit(500_000), Some(FloppyType::F720K));
        assert_eq!(FloppyType::smallest_fit(800_000), Some(FloppyType::F144M));
        assert_eq!(FloppyType::smallest_fit(1_500_000), Some(FloppyType::F160M));
        assert_eq!(FloppyType::smallest_fit(2_000_000), None);
    }

    #[test]
    fn geometry_data_region_is_within_the_image() {
        for floppy_type in [FloppyType::F720K, FloppyType::F144M, FloppyType::F160M] {
            let geometry = Geometry::for_type(floppy_type);
            let data_bytes = geometry.data_start_sector as usize * BYTES_PER_SECTOR;
            assert!(data_bytes < floppy_type.capacity_bytes());
            assert!(geometry.total_clusters > 0);
        }
    }

    #[test]
    fn write_bpb_sets_boot_signature() {
        let mut image = vec![0u8; FloppyType::F720K.capacity_bytes()];
        write_bpb(&mut image, FloppyType::F720K);
        assert_eq!(image[510], 0x55);
        assert_eq!(image[511], 0xAA);
        assert_eq!(u16::from_le_bytes([image[22], image[23]]), 3);
    }
}
