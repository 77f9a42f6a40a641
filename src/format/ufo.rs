//! UFO (Super UFO) 512-byte part header.

use crate::rom::SnesRom;

const MBIT: usize = 131_072;

fn sram_size_code(sram_bytes: usize) -> u8 {
    if sram_bytes == 0 {
        0
    } else if sram_bytes <= 2048 {
        1
    } else if sram_bytes <= 8192 {
        2
    } else if sram_bytes <= 32768 {
        3
    } else {
        8
    }
}

/// Builds the 512-byte UFO header for one split part.
pub fn generate(rom: &SnesRom, part_size: usize, is_last: bool) -> Vec<u8> {
    let mut header = vec![0u8; 512];
    let size_units = (part_size / 8192) as u16;
    header[0..2].copy_from_slice(&size_units.to_le_bytes());
    header[2] = if is_last { 0x00 } else { 0x40 };
    header[8..16].copy_from_slice(b"SUPERUFO");

    let has_sram = rom.sram_bytes() > 0;
    header[16] = if has_sram { 1 } else { 0 };
    header[17] = (rom.data.len() / MBIT) as u8;
    header[18] = if rom.is_hirom() { 0 } else { 1 };
    header[19] = sram_size_code(rom.sram_bytes());

    if rom.is_hirom() {
        if has_sram {
            header[21] = 0x0C;
            header[22] = 0x02;
            header[23] = 0x00;
        }
    } else if has_sram {
        header[20] = 2;
        header[21] = 0x0F;
        header[22] = 3;
        header[23] = 3;
    } else if rom.has_dsp() {
        header[20] = 1;
        header[21] = 0x0C;
    } else {
        header[22] = 2;
        header[23] = 0;
    }

    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomType;

    fn base_rom(rom_type: RomType, sram_size_byte: u8, rom_type_byte: u8, data_len: usize) -> SnesRom {
        SnesRom {
            data: vec![0u8; data_len],
            rom_type,
            header_offset: 0,
            title: "TEST".into(),
            map_byte: 0,
            rom_type_byte,
            rom_size_byte: 9,
            sram_size_byte,
            country: 0,
            maker: 0,
            version: 0,
            checksum: 0,
            complement: 0xFFFF,
        }
    }

    #[test]
    fn header_is_exactly_512_bytes() {
        let rom = base_rom(RomType::LoRom, 0, 0, 0x80000);
        assert_eq!(generate(&rom, 8192, true).len(), 512);
    }

    #[test]
    fn magic_string_and_last_flag() {
        let rom = base_rom(RomType::LoRom, 0, 0, 0x80000);
        let header = generate(&rom, 8192, false);
        assert_eq!(&header[8..16], b"SUPERUFO");
        assert_eq!(header[2], 0x40);
        assert_eq!(generate(&rom, 8192, true)[2], 0x00);
    }

    #[test]
    fn rom_size_in_mbit_byte() {
        let rom = base_rom(RomType::LoRom, 0, 0, 8 * MBIT);
        assert_eq!(generate(&rom, 8192, true)[17], 8);
    }

    #[test]
    fn lorom_flag_byte_18() {
        let lorom = base_rom(RomType::LoRom, 0, 0, 0x80000);
        assert_eq!(generate(&lorom, 8192, true)[18], 1);
        let hirom = base_rom(RomType::HiRom, 0, 0, 0x100000);
        assert_eq!(generate(&hirom, 8192, true)[18], 0);
    }

    #[test]
    fn hirom_with_sram_fills_table_row() {
        let rom = base_rom(RomType::HiRom, 3, 0, 0x100000);
        let header = generate(&rom, 8192, true);
        assert_eq!(header[21], 0x0C);
        assert_eq!(header[22], 0x02);
        assert_eq!(header[23], 0x00);
    }

    #[test]
    fn lorom_with_sram_fills_table_row() {
        let rom = base_rom(RomType::LoRom, 3, 0, 0x80000);
        let header = generate(&rom, 8192, true);
        assert_eq!(header[20], 2);
        assert_eq!(header[21], 0x0F);
        assert_eq!(header[22], 3);
        assert_eq!(header[23], 3);
    }

    #[test]
    fn lorom_no_sram_with_dsp() {
        let rom = base_rom(RomType::LoRom, 0, 0x03, 0x80000);
        let header = generate(&rom, 8192, true);
        assert_eq!(header[20], 1);
        assert_eq!(header[21], 0x0C);
    }

    #[test]
    fn lorom_no_sram_no_dsp() {
        let rom = base_rom(RomType::LoRom, 0, 0, 0x80000);
        let header = generate(&rom, 8192, true);
        assert_eq!(header[22], 2);
        assert_eq!(header[23], 0);
    }
}
