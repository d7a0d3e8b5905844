/// Nibble table for polynomial 0x04C11DB7, indexed by the top four bits of the running value.
const TABLE: [u32; 16] = [
    0x00000000, 0x04C11DB7, 0x09823B6E, 0x0D4326D9, 0x130476DC, 0x17C56B6B, 0x1A864DB2, 0x1E475005,
    0x2608EDB8, 0x22C9F00F, 0x2F8AD6D6, 0x2B4BCB61, 0x350C9B64, 0x31CD86D3, 0x3C8EA00A, 0x384FBDBD,
];

/// CRC32 as computed by the sensor over a touch frame.
///
/// Input is consumed in little-endian 32-bit words, MSB-first, with no reflection and no final
/// xor. `data.len()` must be a multiple of 4; a trailing partial word is ignored.
pub fn crc32(data: &[u8]) -> u32 {
    debug_assert!(data.len() % 4 == 0);

    let mut crc = 0xFFFF_FFFF;
    for word in data.chunks_exact(4) {
        crc ^= u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        for _ in 0..8 {
            crc = (crc << 4) ^ TABLE[(crc >> 28) as usize];
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::FRAME_MARKER;

    #[test]
    fn single_word() {
        assert_eq!(crc32(&0x1234_5678u32.to_le_bytes()), 0xDF8A_8A2B);
    }

    #[test]
    fn empty_is_seed() {
        assert_eq!(crc32(&[]), 0xFFFF_FFFF);
    }

    #[test]
    fn zero_payload_frame() {
        let mut data = [0u8; 68];
        data[..4].copy_from_slice(&FRAME_MARKER);
        assert_eq!(crc32(&data), 0x9F9A_5797);
    }
}
