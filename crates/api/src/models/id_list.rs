//! Compact per-(index, key, file) stub id list.
//!
//! A file commonly contributes zero or one stub per index key, so the codec
//! special-cases those sizes: an empty list is the single sentinel integer
//! `i32::MAX`, a one-element list is the bare id, and a longer list is the
//! negated length followed by the ids.

use crate::error::{ApiError, ApiResult};
use crate::models::ids::StubId;
use crate::models::varint;

const EMPTY_SENTINEL: i64 = i32::MAX as i64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StubIdList {
    #[default]
    Empty,
    Single(StubId),
    /// Two or more ids, sorted ascending.
    Many(Vec<StubId>),
}

impl StubIdList {
    /// Normalizes a sorted id vector into the compact representation.
    pub fn from_ids(mut ids: Vec<StubId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        match ids.len() {
            0 => StubIdList::Empty,
            1 => StubIdList::Single(ids[0]),
            _ => StubIdList::Many(ids),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StubIdList::Empty => 0,
            StubIdList::Single(_) => 1,
            StubIdList::Many(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StubIdList::Empty)
    }

    pub fn get(&self, index: usize) -> Option<StubId> {
        match self {
            StubIdList::Empty => None,
            StubIdList::Single(id) => (index == 0).then_some(*id),
            StubIdList::Many(ids) => ids.get(index).copied(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = StubId> + '_ {
        (0..self.len()).map_while(|i| self.get(i))
    }

    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            StubIdList::Empty => varint::write_i64(buf, EMPTY_SENTINEL),
            StubIdList::Single(id) => varint::write_i64(buf, i64::from(id.0)),
            StubIdList::Many(ids) => {
                varint::write_i64(buf, -(ids.len() as i64));
                for id in ids {
                    varint::write_i64(buf, i64::from(id.0));
                }
            }
        }
    }

    pub fn decode(buf: &[u8], pos: &mut usize) -> ApiResult<Self> {
        let head = varint::read_i64(buf, pos)?;
        if head == EMPTY_SENTINEL {
            return Ok(StubIdList::Empty);
        }
        if head >= 0 {
            return Ok(StubIdList::Single(StubId(head as u32)));
        }
        let len = head
            .checked_neg()
            .ok_or_else(|| ApiError::Corrupted("stub id list length overflows".to_string()))?
            as u64;
        // Each id takes at least one byte; a declared length beyond the
        // remaining input is corrupt, not a capacity to allocate.
        if len > (buf.len() - *pos) as u64 {
            return Err(ApiError::Corrupted(format!(
                "stub id list length {len} exceeds remaining input"
            )));
        }
        let len = len as usize;
        let mut ids = Vec::with_capacity(len);
        for _ in 0..len {
            let id = varint::read_i64(buf, pos)?;
            if id < 0 || id > i64::from(u32::MAX) {
                return Err(ApiError::Corrupted(format!("stub id out of range: {id}")));
            }
            ids.push(StubId(id as u32));
        }
        Ok(StubIdList::Many(ids))
    }
}

impl serde::Serialize for StubIdList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        serializer.serialize_bytes(&buf)
    }
}

impl<'de> serde::Deserialize<'de> for StubIdList {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor;

        impl<'de> serde::de::Visitor<'de> for BytesVisitor {
            type Value = StubIdList;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("stub id list bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                let mut pos = 0;
                StubIdList::decode(v, &mut pos).map_err(E::custom)
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                self.visit_bytes(&v)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut bytes = Vec::new();
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                self.visit_bytes(&bytes)
            }
        }

        deserializer.deserialize_bytes(BytesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(list: &StubIdList) -> StubIdList {
        let mut buf = Vec::new();
        list.encode(&mut buf);
        let mut pos = 0;
        let decoded = StubIdList::decode(&buf, &mut pos).unwrap();
        assert_eq!(pos, buf.len());
        decoded
    }

    #[test]
    fn empty_list_uses_sentinel() {
        let mut buf = Vec::new();
        StubIdList::Empty.encode(&mut buf);
        let mut pos = 0;
        assert_eq!(varint::read_i64(&buf, &mut pos).unwrap(), i32::MAX as i64);
        assert_eq!(round_trip(&StubIdList::Empty), StubIdList::Empty);
    }

    #[test]
    fn single_id_encodes_bare() {
        let list = StubIdList::Single(StubId(42));
        let mut buf = Vec::new();
        list.encode(&mut buf);
        let mut pos = 0;
        assert_eq!(varint::read_i64(&buf, &mut pos).unwrap(), 42);
        assert_eq!(pos, buf.len(), "no length prefix for a single id");
        assert_eq!(round_trip(&list), list);
    }

    #[test]
    fn multi_id_encodes_negated_length() {
        let list = StubIdList::from_ids(vec![StubId(3), StubId(7), StubId(11)]);
        let mut buf = Vec::new();
        list.encode(&mut buf);
        let mut pos = 0;
        assert_eq!(varint::read_i64(&buf, &mut pos).unwrap(), -3);
        assert_eq!(varint::read_i64(&buf, &mut pos).unwrap(), 3);
        assert_eq!(varint::read_i64(&buf, &mut pos).unwrap(), 7);
        assert_eq!(varint::read_i64(&buf, &mut pos).unwrap(), 11);
        assert_eq!(round_trip(&list), list);
    }

    #[test]
    fn from_ids_sorts_and_dedupes() {
        let list = StubIdList::from_ids(vec![StubId(7), StubId(3), StubId(7)]);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![StubId(3), StubId(7)]);
    }

    #[test]
    fn oversized_declared_length_is_corrupt_not_a_capacity() {
        // A negated length far beyond the buffer must error, not allocate.
        let mut buf = Vec::new();
        varint::write_i64(&mut buf, -(1i64 << 61));
        let mut pos = 0;
        assert!(StubIdList::decode(&buf, &mut pos).is_err());

        // The most negative length cannot even be negated.
        let mut buf = Vec::new();
        varint::write_i64(&mut buf, i64::MIN);
        let mut pos = 0;
        assert!(StubIdList::decode(&buf, &mut pos).is_err());
    }
}
