// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The pprof wire format: prost messages plus the gzip framing stored
//! payloads and merged results travel in.

mod compression;
mod proto;

pub use compression::*;
pub use proto::*;

use crate::error::DecodeError;
use prost::Message;

/// Inflates the payload if needed, then decodes the pprof message. No
/// references are checked here; see [crate::profile::Profile::try_from_pprof].
pub fn decode_message(payload: &[u8], max_payload_bytes: usize) -> Result<Profile, DecodeError> {
    let bytes = decode_payload(payload, max_payload_bytes)?;
    Ok(Profile::decode(bytes.as_ref())?)
}
