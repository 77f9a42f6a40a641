//! Hardware capacity validators (C3): reject ROM payloads too large for the
//! requested copier before the splitter does any work.

use crate::error::ConversionError;
use crate::Format;

const UFO_MAX_BYTES: u64 = 32 * 131_072; // 32 Mbit
const GD3_MAX_BYTES: u64 = 32 * 131_072; // 32 Mbit, non-ExHiROM
const GD3_EXHIROM_MAX_BYTES: u64 = 64 * 131_072; // 64 Mbit

/// Rejects payloads the target copier's hardware cannot address. FIG and
/// SWC have no enforced ceiling; UFO is capped at 32 Mbit; GD3 is capped at
/// 32 Mbit unless the ROM is ExHiROM, which raises the cap to 64 Mbit.
pub fn validate_hardware_capacity(
    format: Format,
    is_exhirom: bool,
    payload_bytes: u64,
) -> Result<(), ConversionError> {
    let max_bytes = match format {
        Format::Fig | Format::Swc => return Ok(()),
        Format::Ufo => UFO_MAX_BYTES,
        Format::Gd3 if is_exhirom => GD3_EXHIROM_MAX_BYTES,
        Format::Gd3 => GD3_MAX_BYTES,
    };
    if payload_bytes > max_bytes {
        return Err(ConversionError::UnsupportedHardware {
            format,
            actual_bytes: payload_bytes,
            max_bytes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fig_and_swc_have_no_cap() {
        assert!(validate_hardware_capacity(Format::Fig, false, u64::MAX / 2).is_ok());
        assert!(validate_hardware_capacity(Format::Swc, true, u64::MAX / 2).is_ok());
    }

    #[test]
    fn ufo_rejects_over_32_mbit() {
        let err = validate_hardware_capacity(Format::Ufo, true, 48 * 131_072).unwrap_err();
        match err {
            ConversionError::UnsupportedHardware {
                format,
                actual_bytes,
                max_bytes,
            } => {
                assert_eq!(format, Format::Ufo);
                assert_eq!(actual_bytes, 48 * 131_072);
                assert_eq!(max_bytes, UFO_MAX_BYTES);
            }
            other => panic!("expected UnsupportedHardware, got {:?}", other),
        }
    }

    #[test]
    fn ufo_accepts_exactly_32_mbit() {
        assert!(validate_hardware_capacity(Format::Ufo, false, UFO_MAX_BYTES).is_ok());
    }

    #[test]
    fn gd3_non_exhirom_capped_at_32_mbit() {
        assert!(validate_hardware_capacity(Format::Gd3, false, 40 * 131_072).is_err());
    }

    #[test]
    fn gd3_exhirom_allows_up_to_64_mbit() {
        assert!(validate_hardware_capacity(Format::Gd3, true, 60 * 131_072).is_ok());
        assert!(validate_hardware_capacity(Format::Gd3, true, 65 * 131_072).is_err());
    }
}
