use nom::{number::complete::le_u8, IResult};

pub use crate::encoder::varint_encoder::write_varint;

/// Number of bytes that carry 7 payload bits and a continuation bit.
pub(crate) const MAX_CONTINUATION_BYTES: usize = 8;

/// Parses an unsigned LEB128 varint.
///
/// The first 8 bytes contribute 7 bits each. If all of them have the
/// continuation bit set, a 9th byte is consumed whole and provides bits 56..64,
/// so any u64 fits in at most 9 bytes.
pub fn read_varint(input: &[u8]) -> IResult<&[u8], u64> {
    let mut input_pointer = input;
    let mut x: u64 = 0;

    for i in 0..MAX_CONTINUATION_BYTES {
        let (new_input_pointer, byte) = le_u8(input_pointer)?;
        input_pointer = new_input_pointer;

        x |= u64::from(byte & 0x7f) << (7 * i);
        if byte < 0x80 {
            return Ok((input_pointer, x));
        }
    }

    let (input_pointer, last_byte) = le_u8(input_pointer)?;
    Ok((input_pointer, x | u64::from(last_byte) << 56))
}
