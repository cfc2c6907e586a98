//! Little-endian decoding of the fixed-width fields found in OLE and BIFF8 structures.
//! Callers slice the input; every function reads from the start of the slice it is given.

#[inline]
pub(crate) fn le_u16(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[inline]
pub(crate) fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[inline]
pub(crate) fn le_u64(bytes: &[u8]) -> u64 {
    let mut buffer = [0u8; 8];
    buffer.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buffer)
}

#[inline]
pub(crate) fn le_f64(bytes: &[u8]) -> f64 {
    f64::from_bits(le_u64(bytes))
}

/// Sector ids and sizes are stored as u32 but used as indexes.
#[inline]
pub(crate) fn le_index(bytes: &[u8]) -> usize {
    le_u32(bytes) as usize
}

/// Splits a sector into consecutive u32 indexes, ignoring a trailing partial word.
pub(crate) fn le_indexes(bytes: &[u8]) -> impl Iterator<Item = usize> + '_ {
    bytes.chunks_exact(4).map(le_index)
}
