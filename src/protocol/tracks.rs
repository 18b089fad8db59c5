use std::io::{Cursor, Read, Write};

use base64::prelude::*;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::common::Severity;

/// Highest binary track layout this client understands.
const MAX_TRACK_VERSION: u8 = 3;
/// Header flag telling that a version byte follows the message header.
const TRACK_INFO_VERSIONED: u32 = 1;

/// A loaded track: the opaque blob the node plays plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Base64 blob passed back to the node in `play`.
    pub track: String,
    pub info: TrackInfo,
}

impl Track {
    /// Builds a track from a blob, decoding the metadata locally.
    pub fn from_encoded(encoded: impl Into<String>) -> Option<Self> {
        let track = encoded.into();
        let info = TrackInfo::decode(&track)?;
        Some(Self { track, info })
    }
}

/// Metadata for an audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    /// Duration in milliseconds. 0 for live streams.
    pub length: u64,
    pub is_stream: bool,
    /// Start position in milliseconds.
    pub position: u64,
    pub title: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artwork_url: Option<String>,
    #[serde(default)]
    pub isrc: Option<String>,
    #[serde(default)]
    pub source_name: String,
}

impl TrackInfo {
    /// Encodes the metadata into a track blob.
    ///
    /// Layout (version 3):
    ///   [u32 header: payload size | flags << 30]
    ///   [u8 version] [utf title] [utf author] [u64 length] [utf identifier]
    ///   [u8 is_stream] [opt_utf uri] [opt_utf artwork_url] [opt_utf isrc]
    ///   [utf source_name] [u64 position]
    pub fn encode(&self) -> String {
        let mut body = Vec::new();
        body.push(MAX_TRACK_VERSION);
        write_utf(&mut body, &self.title);
        write_utf(&mut body, &self.author);
        body.extend_from_slice(&self.length.to_be_bytes());
        write_utf(&mut body, &self.identifier);
        body.push(u8::from(self.is_stream));
        write_opt_utf(&mut body, self.uri.as_deref());
        write_opt_utf(&mut body, self.artwork_url.as_deref());
        write_opt_utf(&mut body, self.isrc.as_deref());
        write_utf(&mut body, &self.source_name);
        body.extend_from_slice(&self.position.to_be_bytes());

        let header = (body.len() as u32) | (TRACK_INFO_VERSIONED << 30);
        let mut out = Vec::with_capacity(body.len() + 4);
        out.extend_from_slice(&header.to_be_bytes());
        out.extend_from_slice(&body);

        BASE64_STANDARD.encode(&out)
    }

    /// Decodes a track blob without asking the node. Versions 1 to 3 are
    /// accepted; anything else, or a truncated blob, yields `None`.
    pub fn decode(encoded: &str) -> Option<Self> {
        let data = BASE64_STANDARD.decode(encoded).ok()?;
        if data.len() < 4 {
            return None;
        }

        let mut cursor = Cursor::new(data);
        let header = cursor.read_u32::<BigEndian>().ok()?;
        let flags = (header >> 30) & 0x03;

        let version = if (flags & TRACK_INFO_VERSIONED) != 0 {
            cursor.read_u8().ok()?
        } else {
            1
        };
        if version == 0 || version > MAX_TRACK_VERSION {
            return None;
        }

        let title = read_utf(&mut cursor)?;
        let author = read_utf(&mut cursor)?;
        let length = cursor.read_u64::<BigEndian>().ok()?;
        let identifier = read_utf(&mut cursor)?;
        let is_stream = cursor.read_u8().ok()? != 0;

        let uri = if version >= 2 {
            read_opt_utf(&mut cursor)?
        } else {
            None
        };
        let (artwork_url, isrc) = if version >= 3 {
            (read_opt_utf(&mut cursor)?, read_opt_utf(&mut cursor)?)
        } else {
            (None, None)
        };

        let source_name = read_utf(&mut cursor)?;
        // Older encoders stop before the position field.
        let position = cursor.read_u64::<BigEndian>().unwrap_or(0);

        Some(Self {
            identifier,
            is_seekable: !is_stream,
            author,
            length,
            is_stream,
            position,
            title,
            uri,
            artwork_url,
            isrc,
            source_name,
        })
    }
}

/// Writes a length-prefixed string in the modified UTF-8 the node's
/// `DataOutput.writeUTF` produces: NUL as `C0 80`, and characters outside the
/// BMP as two 3-byte surrogates.
fn write_utf(w: &mut Vec<u8>, s: &str) {
    let mut bytes = Vec::with_capacity(s.len());
    for ch in s.chars() {
        let mut units = [0u16; 2];
        let mut encoded = Vec::with_capacity(6);
        for &unit in ch.encode_utf16(&mut units).iter() {
            push_modified_utf8(&mut encoded, unit);
        }
        // The length prefix is a u16; drop whole characters past it.
        if bytes.len() + encoded.len() > u16::MAX as usize {
            break;
        }
        bytes.extend_from_slice(&encoded);
    }

    // Writes into a Vec cannot fail.
    let _ = w.write_u16::<BigEndian>(bytes.len() as u16);
    let _ = w.write_all(&bytes);
}

fn push_modified_utf8(out: &mut Vec<u8>, unit: u16) {
    match unit {
        0x0001..=0x007F => out.push(unit as u8),
        0x0000 | 0x0080..=0x07FF => {
            out.push(0xC0 | (unit >> 6) as u8);
            out.push(0x80 | (unit & 0x3F) as u8);
        }
        _ => {
            out.push(0xE0 | (unit >> 12) as u8);
            out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
            out.push(0x80 | (unit & 0x3F) as u8);
        }
    }
}

/// Inverse of [`write_utf`]. Surrogate pairs are joined back into one
/// character; malformed sequences and lone surrogates yield `None`.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    let continuation = |b: Option<u8>| b.filter(|b| b & 0xC0 == 0x80).map(|b| u16::from(b & 0x3F));

    while let Some(b) = iter.next() {
        let unit = match b {
            0x00..=0x7F => u16::from(b),
            _ if b & 0xE0 == 0xC0 => (u16::from(b & 0x1F) << 6) | continuation(iter.next())?,
            _ if b & 0xF0 == 0xE0 => {
                let hi = continuation(iter.next())?;
                let lo = continuation(iter.next())?;
                (u16::from(b & 0x0F) << 12) | (hi << 6) | lo
            }
            _ => return None,
        };
        units.push(unit);
    }
    String::from_utf16(&units).ok()
}

fn write_opt_utf(w: &mut Vec<u8>, s: Option<&str>) {
    match s {
        Some(s) => {
            w.push(1);
            write_utf(w, s);
        }
        None => w.push(0),
    }
}

fn read_utf<R: Read>(r: &mut R) -> Option<String> {
    let len = r.read_u16::<BigEndian>().ok()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).ok()?;
    decode_modified_utf8(&buf)
}

/// Outer `None` means the blob ended early; inner `None` means the field was absent.
fn read_opt_utf<R: Read>(r: &mut R) -> Option<Option<String>> {
    let present = r.read_u8().ok()? != 0;
    if present {
        read_utf(r).map(Some)
    } else {
        Some(None)
    }
}

/// Result of `GET /loadtracks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    pub load_type: LoadType,
    #[serde(default)]
    pub playlist_info: PlaylistInfo,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<LoadException>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadType {
    TrackLoaded,
    PlaylistLoaded,
    SearchResult,
    NoMatches,
    LoadFailed,
}

/// Playlist metadata. Empty unless a playlist was loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    #[serde(default)]
    pub name: Option<String>,
    /// Index of the selected track, or -1 if none.
    #[serde(default)]
    pub selected_track: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadException {
    pub message: Option<String>,
    pub severity: Severity,
}
