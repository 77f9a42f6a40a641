//! SWC/FIG block interleaving.
//!
//! The historical SWC and FIG copiers load ROMs from floppy in an
//! interleaved byte order; this module pre-applies that permutation (and
//! mirror-extends ROMs larger than 8 Mbit up to the next 8-Mbit boundary)
//! so the resulting bytes play back correctly on the copier hardware. A
//! ROM no larger than 8 Mbit is interleaved at its own size and is never
//! padded up to a full 8 Mbit.

/// One "Mbit" as used throughout this crate: 1024*1024 bits = 131072 bytes.
pub const MBIT: usize = 131_072;
const EIGHT_MBIT: usize = 8 * MBIT;
const FOUR_MBIT: usize = 4 * MBIT;
const SIXTY_FOUR_KB: usize = 65_536;
const THIRTY_TWO_KB: usize = 32_768;

/// The length `interleave` will produce for an input of length `len`: `len`
/// unchanged if it is already at most 8 Mbit, otherwise the next multiple
/// of 8 Mbit at or above `len`.
pub fn target_length(len: usize) -> usize {
    if len <= EIGHT_MBIT {
        len
    } else {
        len.div_ceil(EIGHT_MBIT) * EIGHT_MBIT
    }
}

/// Repeatedly appends a copy of the last 4-Mbit-aligned tail until the
/// buffer reaches `target_length(data.len())`. A 12-Mbit ROM becomes a
/// 16-Mbit payload with the last 4 Mbit duplicated from bytes 8-12 Mbit.
fn mirror_extend(data: &[u8]) -> Vec<u8> {
    let target = target_length(data.len());
    let mut out = data.to_vec();
    if out.is_empty() {
        out.resize(target, 0);
        return out;
    }
    while out.len() < target {
        let tail_start = if out.len() % FOUR_MBIT == 0 {
            out.len() - FOUR_MBIT
        } else {
            (out.len() / FOUR_MBIT) * FOUR_MBIT
        };
        let tail = out[tail_start..].to_vec();
        out.extend_from_slice(&tail);
    }
    out.truncate(target);
    out
}

/// Applies the global 32-KB block swap described in spec §4.2 / P3: for
/// each 64-KB pair, its lower 32-KB half moves to the second half of the
/// output and its upper 32-KB half moves to the first half.
///
/// Exposed at crate visibility so the UFO splitter can apply it to an
/// exact (non-mirror-extended) length for its irregular-chunk case.
pub(crate) fn block_swap(data: &[u8]) -> Vec<u8> {
    let n = data.len();
    let half = n / 2;
    let mut out = vec![0u8; n];
    let pairs = n / SIXTY_FOUR_KB;
    for i in 0..pairs {
        let pair_start = i * SIXTY_FOUR_KB;
        let lower = &data[pair_start..pair_start + THIRTY_TWO_KB];
        let upper = &data[pair_start + THIRTY_TWO_KB..pair_start + SIXTY_FOUR_KB];
        out[half + i * THIRTY_TWO_KB..half + i * THIRTY_TWO_KB + THIRTY_TWO_KB]
            .copy_from_slice(lower);
        out[i * THIRTY_TWO_KB..i * THIRTY_TWO_KB + THIRTY_TWO_KB].copy_from_slice(upper);
    }
    out
}

/// Mirror-extends `data` to the next 8-Mbit boundary, then applies the
/// SWC/FIG block-swap interleave.
pub fn interleave(data: &[u8]) -> Vec<u8> {
    let extended = mirror_extend(data);
    block_swap(&extended)
}
