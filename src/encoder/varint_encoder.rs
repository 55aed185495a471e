use crate::varint::MAX_CONTINUATION_BYTES;

/// Write a u64 as an unsigned LEB128 varint.
///
/// Values of 2^56 and above take 9 bytes: 8 bytes of 7 bits with the
/// continuation bit set, then the top 8 bits as a plain byte.
pub fn write_varint<W: std::io::Write>(value: u64, writer: &mut W) -> std::io::Result<()> {
    let mut x: u64 = value;
    for _ in 0..MAX_CONTINUATION_BYTES {
        if x < 0x80 {
            return writer.write_all(&[x as u8]);
        }
        writer.write_all(&[(x as u8) | 0x80])?;
        x >>= 7;
    }
    writer.write_all(&[x as u8])
}
