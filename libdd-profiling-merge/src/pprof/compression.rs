// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::DecodeError;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use prost::encoding::{encode_key, encode_varint, WireType};
use prost::Message;
use std::borrow::Cow;
use std::io::{self, Read, Write};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(payload: &[u8]) -> bool {
    payload.starts_with(&GZIP_MAGIC)
}

/// Returns the serialized protobuf inside the payload. Gzip is detected by
/// its magic bytes and inflated, anything else is taken to be raw protobuf.
/// Either way the protobuf may be at most `limit` bytes.
pub fn decode_payload(payload: &[u8], limit: usize) -> Result<Cow<'_, [u8]>, DecodeError> {
    if !is_gzip(payload) {
        if payload.len() > limit {
            return Err(DecodeError::PayloadTooLarge { limit });
        }
        return Ok(Cow::Borrowed(payload));
    }

    // Read one byte past the limit so an oversized payload is detectable
    // without inflating all of it.
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut inflated = Vec::new();
    MultiGzDecoder::new(payload)
        .take(cap)
        .read_to_end(&mut inflated)
        .map_err(DecodeError::Decompress)?;
    if inflated.len() > limit {
        return Err(DecodeError::PayloadTooLarge { limit });
    }
    Ok(Cow::Owned(inflated))
}

/// Serializes protobuf fields of a pprof message one at a time, and
/// compresses them with gzip as they are written.
pub struct CompressedProtobufSerializer {
    buffer: Vec<u8>,
    zipper: GzEncoder<Vec<u8>>,
}

impl CompressedProtobufSerializer {
    /// `level` is the gzip level, 0 (none) through 9 (best).
    pub fn with_capacity(capacity: usize, level: u32) -> Self {
        let zipper = GzEncoder::new(Vec::with_capacity(capacity), Compression::new(level));
        Self {
            buffer: Vec::with_capacity(128),
            zipper,
        }
    }

    /// Encodes a length-delimited message field.
    pub fn encode(&mut self, tag: u32, item: &impl Message) -> io::Result<()> {
        self.buffer.clear();
        encode_key(tag, WireType::LengthDelimited, &mut self.buffer);
        encode_varint(item.encoded_len() as u64, &mut self.buffer);
        item.encode_raw(&mut self.buffer);
        self.zipper.write_all(&self.buffer)
    }

    /// Encodes an int64 field. Zero is the default and is skipped.
    pub fn encode_int64(&mut self, tag: u32, value: i64) -> io::Result<()> {
        if value == 0 {
            return Ok(());
        }
        self.encode_int64_unconditionally(tag, value)
    }

    /// Encodes one element of a repeated int64 field. Zero is kept.
    pub fn encode_int64_unconditionally(&mut self, tag: u32, value: i64) -> io::Result<()> {
        self.buffer.clear();
        encode_key(tag, WireType::Varint, &mut self.buffer);
        encode_varint(value as u64, &mut self.buffer);
        self.zipper.write_all(&self.buffer)
    }

    /// Encodes one element of a repeated string field. The string goes
    /// straight to the zipper instead of through the scratch buffer.
    pub fn encode_str(&mut self, tag: u32, item: &str) -> io::Result<()> {
        self.buffer.clear();
        encode_key(tag, WireType::LengthDelimited, &mut self.buffer);
        encode_varint(item.len() as u64, &mut self.buffer);
        self.zipper.write_all(&self.buffer)?;
        self.zipper.write_all(item.as_bytes())
    }

    pub fn finish(self) -> io::Result<Vec<u8>> {
        self.zipper.finish()
    }
}
