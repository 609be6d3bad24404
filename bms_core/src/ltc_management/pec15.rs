/// Generator polynomial x^15 + x^14 + x^10 + x^8 + x^7 + x^4 + x^3 + 1.
const CRC15_POLY: u16 = 0x4599;

const PEC15_SEED: u16 = 16;

const fn build_crc15_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut remainder = (i as u16) << 7;
        let mut bit = 0;
        while bit < 8 {
            if remainder & 0x4000 != 0 {
                remainder = (remainder << 1) ^ CRC15_POLY;
            } else {
                remainder <<= 1;
            }
            bit += 1;
        }
        table[i] = remainder;
        i += 1;
    }
    table
}

pub(crate) static CRC15_TABLE: [u16; 256] = build_crc15_table();

/// Packet error code used by the LTC681x family. The 15-bit CRC is returned shifted
/// left by one, so the LSB is always 0.
pub fn pec15(data: &[u8]) -> u16 {
    let mut remainder: u16 = PEC15_SEED;

    for byte in data {
        let address = (((remainder >> 7) ^ (*byte as u16)) & 0xff) as usize;
        remainder = (remainder << 8) ^ CRC15_TABLE[address];
    }

    remainder << 1
}

pub fn pec15_of_register_group(data: &[u8; 6]) -> u16 {
    pec15(data)
}

pub fn pec15_of_command(cmd: &[u8; 2]) -> u16 {
    pec15(cmd)
}

/// PEC in wire order (big endian).
pub fn pec15_bytes(data: &[u8]) -> [u8; 2] {
    pec15(data).to_be_bytes()
}
