// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Placing received element blocks into a growing channel.

use vantage_proto::ProtocolError;

/// Store `count` elements produced by `next` at `offset` in `dst`.
///
/// The block must end within `limit` and may overwrite existing elements or
/// extend `dst` at its end, never skip ahead of it. The whole block is read
/// before `dst` is touched, so a rejected block leaves `dst` unchanged.
pub fn place_block<T>(
    dst: &mut Vec<T>,
    limit: u32,
    offset: u32,
    count: u32,
    mut next: impl FnMut() -> Result<T, ProtocolError>,
) -> Result<(), ProtocolError> {
    let start = offset as usize;
    if u64::from(offset) + u64::from(count) > u64::from(limit) || start > dst.len() {
        return Err(ProtocolError::IndexingOutOfRange {
            offset,
            count,
            len: limit,
        });
    }
    let block = (0..count).map(|_| next()).collect::<Result<Vec<T>, _>>()?;

    let mut block = block.into_iter();
    for (slot, value) in dst[start..].iter_mut().zip(block.by_ref()) {
        *slot = value;
    }
    dst.extend(block);
    Ok(())
}
