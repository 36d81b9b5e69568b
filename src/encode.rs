// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical Encoding
//!
//! Deterministic byte serialization of schema-ordered records. This is the
//! input of every chain hash, so it has no degrees of freedom:
//! - field order comes from the [`Schema`], never from call order
//! - integers are fixed-width big-endian
//! - strings are UTF-8 with a u32 big-endian length prefix
//! - every value is preceded by a one-byte type tag
//!
//! # Layout
//! ```text
//! [TAG_STR][len u32][schema name]
//! for each schema field, in order:
//!   [TAG_U64][u64]            | sequence numbers
//!   [TAG_STR][len u32][utf8]  | text, timestamps
//!   [TAG_DIGEST][32 bytes]    | hashes
//! ```
//!
//! Violating the schema (unknown, duplicate, out-of-order or missing field) is
//! a coding error and surfaces as [`KernelError::EncodingContract`].

use crate::error::{KernelError, Result};
use crate::types::digest::Digest;
use byteorder::{BigEndian, ByteOrder};

pub const TAG_U64: u8 = 0x01;
pub const TAG_STR: u8 = 0x02;
pub const TAG_DIGEST: u8 = 0x03;

/// Fixed field order for one record type. The name doubles as a domain
/// separator so two schemas never produce the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

pub struct CanonicalEncoder<'s> {
    schema: &'s Schema,
    buf: Vec<u8>,
    next: usize,
}

impl<'s> CanonicalEncoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        let mut enc = Self {
            schema,
            buf: Vec::with_capacity(128),
            next: 0,
        };
        // Schema names are short static literals; the u32 prefix cannot overflow.
        enc.put_str_unchecked(schema.name);
        enc
    }

    pub fn u64(mut self, field: &str, value: u64) -> Result<Self> {
        self.expect(field)?;
        let mut word = [0u8; 8];
        BigEndian::write_u64(&mut word, value);
        self.buf.push(TAG_U64);
        self.buf.extend_from_slice(&word);
        Ok(self)
    }

    pub fn str(mut self, field: &str, value: &str) -> Result<Self> {
        self.expect(field)?;
        if u32::try_from(value.len()).is_err() {
            return Err(self.violation(field));
        }
        self.put_str_unchecked(value);
        Ok(self)
    }

    pub fn digest(mut self, field: &str, value: &Digest) -> Result<Self> {
        self.expect(field)?;
        self.buf.push(TAG_DIGEST);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(self)
    }

    /// Returns the encoded bytes once every schema field has been supplied.
    pub fn finish(self) -> Result<Vec<u8>> {
        match self.schema.fields.get(self.next) {
            Some(missing) => Err(self.violation(missing)),
            None => Ok(self.buf),
        }
    }

    fn expect(&mut self, field: &str) -> Result<()> {
        match self.schema.fields.get(self.next) {
            Some(&want) if want == field => {
                self.next += 1;
                Ok(())
            }
            _ => Err(self.violation(field)),
        }
    }

    fn violation(&self, field: &str) -> KernelError {
        KernelError::EncodingContract {
            schema: self.schema.name,
            field: field.to_string(),
        }
    }

    fn put_str_unchecked(&mut self, value: &str) {
        let mut len = [0u8; 4];
        BigEndian::write_u32(&mut len, value.len() as u32);
        self.buf.push(TAG_STR);
        self.buf.extend_from_slice(&len);
        self.buf.extend_from_slice(value.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: Schema = Schema {
        name: "test.pair.v1",
        fields: &["a", "b"],
    };

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = || {
            CanonicalEncoder::new(&PAIR)
                .u64("a", 7)
                .unwrap()
                .str("b", "hello")
                .unwrap()
                .finish()
                .unwrap()
        };
        assert_eq!(enc(), enc());
    }

    #[test]
    fn test_exact_layout() {
        let bytes = CanonicalEncoder::new(&PAIR)
            .u64("a", 1)
            .unwrap()
            .str("b", "é")
            .unwrap()
            .finish()
            .unwrap();

        let mut expected = vec![TAG_STR, 0, 0, 0, 12];
        expected.extend_from_slice(b"test.pair.v1");
        expected.extend_from_slice(&[TAG_U64, 0, 0, 0, 0, 0, 0, 0, 1]);
        expected.extend_from_slice(&[TAG_STR, 0, 0, 0, 2, 0xC3, 0xA9]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_missing_field_is_contract_violation() {
        let err = CanonicalEncoder::new(&PAIR)
            .u64("a", 1)
            .unwrap()
            .finish()
            .unwrap_err();
        assert_eq!(
            err,
            KernelError::EncodingContract {
                schema: "test.pair.v1",
                field: "b".into()
            }
        );
    }

    #[test]
    fn test_out_of_order_field_rejected() {
        let result = CanonicalEncoder::new(&PAIR).str("b", "x");
        assert!(matches!(result, Err(KernelError::EncodingContract { .. })));
    }

    #[test]
    fn test_unknown_and_duplicate_fields_rejected() {
        assert!(CanonicalEncoder::new(&PAIR).u64("zzz", 1).is_err());

        let enc = CanonicalEncoder::new(&PAIR).u64("a", 1).unwrap();
        assert!(enc.u64("a", 2).is_err());
    }

    #[test]
    fn test_length_prefix_prevents_concatenation_collisions() {
        let schema = Schema {
            name: "test.strs.v1",
            fields: &["x", "y"],
        };
        let enc = |x: &str, y: &str| {
            CanonicalEncoder::new(&schema)
                .str("x", x)
                .unwrap()
                .str("y", y)
                .unwrap()
                .finish()
                .unwrap()
        };
        assert_ne!(enc("ab", "c"), enc("a", "bc"));
    }
}
