/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use thiserror::Error;

/// Structural failures raised while encoding or decoding a bridge envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The input is shorter than the minimum envelope framing.
    #[error("envelope too short: {0} bytes")]
    TooShort(usize),

    /// The leading format-version byte is not one this codec understands.
    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    /// A section or value ended before its declared length.
    #[error("truncated {0} section")]
    Truncated(&'static str),

    /// A section carried bytes beyond the structures it declared.
    #[error("malformed {0} section")]
    Malformed(&'static str),

    /// A property entry carried a type tag this codec does not know.
    #[error("unknown property type tag {0}")]
    UnknownTypeTag(u8),

    /// The same property key appeared twice in one envelope.
    #[error("duplicate property key {0:?}")]
    DuplicateKey(String),

    /// A property entry declared a zero-length key.
    #[error("empty property key")]
    EmptyKey,

    /// A string field on the wire was not valid UTF-8.
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// A property key or value is too large for its length prefix.
    #[error("property {0:?} exceeds the wire size limit")]
    PropertyTooLarge(String),
}
