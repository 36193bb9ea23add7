//! Bill-table decoding and value lookup.
//!
//! The validator describes its note channels once per connection, in a
//! fixed-stride binary table fetched as a side effect of the first status
//! poll after reset. Each 5-byte record is
//! `[mantissa, country(3 ASCII), exponent]`; the country code is
//! informational and plays no part in value computation. A record with a
//! zero mantissa marks an unused slot and is omitted from the table; it
//! must never surface as a zero-valued denomination.

use bytes::Bytes;
use cashlink_core::constants::TABLE_RECORD_STRIDE;
use cashlink_core::{ChannelIndex, Denomination, Error, Result};
use std::collections::BTreeMap;

/// Decoded bill table: channel index to note value.
///
/// Indices are the record positions in the device's table and stay stable
/// for the life of a connection.
///
/// # Example
///
/// ```
/// use cashlink_core::ChannelIndex;
/// use cashlink_protocol::DenominationTable;
///
/// // ch0 = 0.05, ch1 unused, ch2 = 1000
/// let bytes = [
///     5, b'U', b'S', b'D', 0x82,
///     0, b'U', b'S', b'D', 0x00,
///     10, b'U', b'S', b'D', 0x02,
/// ];
/// let table = DenominationTable::decode(&bytes).unwrap();
///
/// assert_eq!(table.len(), 2);
/// assert!(table.get(ChannelIndex(1)).is_none());
/// assert_eq!(table.get(ChannelIndex(2)).unwrap().to_string(), "1000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenominationTable {
    entries: BTreeMap<ChannelIndex, Denomination>,
}

impl DenominationTable {
    /// Decode a table from its fixed-stride wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableRecordTruncated`] if the byte count is not a
    /// multiple of the record stride.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut entries = BTreeMap::new();

        let mut chunks = bytes.chunks_exact(TABLE_RECORD_STRIDE);
        for (index, record) in chunks.by_ref().enumerate() {
            let mantissa = record[0];
            let exponent_byte = record[TABLE_RECORD_STRIDE - 1];
            if let Some(value) = Denomination::from_wire(mantissa, exponent_byte) {
                entries.insert(ChannelIndex(index as u8), value);
            }
        }

        if !chunks.remainder().is_empty() {
            return Err(Error::TableRecordTruncated {
                offset: bytes.len() - chunks.remainder().len(),
            });
        }

        Ok(DenominationTable { entries })
    }

    /// Decode from an owned payload, as handed over by the frame codec.
    pub fn decode_payload(payload: &Bytes) -> Result<Self> {
        Self::decode(payload.as_ref())
    }

    /// Value of a channel, if the slot is populated.
    #[must_use]
    pub fn get(&self, index: ChannelIndex) -> Option<Denomination> {
        self.entries.get(&index).copied()
    }

    /// Number of populated channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no populated channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate populated channels in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelIndex, Denomination)> + '_ {
        self.entries.iter().map(|(&idx, &value)| (idx, value))
    }

    /// Smallest populated value.
    #[must_use]
    pub fn min_value(&self) -> Option<Denomination> {
        self.entries.values().copied().min()
    }

    /// Largest populated value.
    #[must_use]
    pub fn max_value(&self) -> Option<Denomination> {
        self.entries.values().copied().max()
    }

    /// Smallest value `>= bound`.
    ///
    /// When the bound exceeds every populated value the overall minimum is
    /// returned instead; `None` only means the table is empty.
    #[must_use]
    pub fn lowest_at_or_above(&self, bound: Denomination) -> Option<Denomination> {
        self.entries
            .values()
            .copied()
            .filter(|&v| v >= bound)
            .min()
            .or_else(|| self.min_value())
    }

    /// Largest value `<= bound`.
    ///
    /// Returns `None` when the bound is below every populated value:
    /// callers must treat that as "reject, nothing qualifies".
    #[must_use]
    pub fn highest_at_or_below(&self, bound: Denomination) -> Option<Denomination> {
        self.entries.values().copied().filter(|&v| v <= bound).max()
    }
}
