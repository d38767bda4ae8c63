#[inline]
pub(crate) fn get_split<const N: usize>(data: &[u8]) -> Option<([u8; N], &[u8])> {
    let (head, rest) = data.split_first_chunk::<N>()?;
    Some((*head, rest))
}

#[inline]
pub(crate) fn le_u32_split(data: &[u8]) -> Option<(u32, &[u8])> {
    get_split::<4>(data).map(|(head, rest)| (u32::from_le_bytes(head), rest))
}

/// Splits off the given number of bytes, returning `None` if there are not
/// enough bytes remaining
#[inline]
pub(crate) fn take_split(data: &[u8], len: usize) -> Option<(&[u8], &[u8])> {
    (data.len() >= len).then(|| data.split_at(len))
}
