// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Capture time, UTC, whole seconds.
//!
//! The canonical text form is `YYYY-MM-DDTHH:MM:SSZ`. It is the form fed to the
//! encoder and the only form accepted back from `timeline.json`.

use crate::error::{KernelError, Result};
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Sub-second precision is dropped.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.trunc_subsecs(0))
    }

    pub fn from_unix_secs(secs: i64) -> Result<Self> {
        DateTime::from_timestamp(secs, 0)
            .map(Timestamp)
            .ok_or_else(|| KernelError::InvalidTimestamp(format!("out of range: {secs}")))
    }

    pub fn unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_canonical_string(&self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }

    /// Parses the canonical form only. Offsets, fractions and lower-case
    /// designators are rejected even when they denote the same instant.
    pub fn parse_canonical(s: &str) -> Result<Self> {
        let naive = NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT)
            .map_err(|e| KernelError::InvalidTimestamp(format!("{s}: {e}")))?;
        let ts = Timestamp(naive.and_utc());
        if ts.to_canonical_string() != s {
            return Err(KernelError::InvalidTimestamp(format!("not canonical: {s}")));
        }
        Ok(ts)
    }

    /// Lenient RFC 3339 input for operators; normalised to UTC whole seconds.
    pub fn parse_rfc3339(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| KernelError::InvalidTimestamp(format!("{s}: {e}")))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_canonical_string())
    }
}

impl FromStr for Timestamp {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        Timestamp::parse_canonical(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse_canonical(&s).map_err(serde::de::Error::custom)
    }
}
