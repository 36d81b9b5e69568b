// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Primitive value types shared by events and manifests.

pub mod digest;
pub mod timestamp;
