//! Codec trait and the framing shared by every format version
//!
//! Payload grammar:
//! ```text
//! payload  := watches SWITCH settings
//! watches  := (START watch END)*
//! settings := (START key type value [END])* EOF
//! ```
//! A version decides what goes inside `watch` and whether settings entries
//! carry an `END` marker.

use crate::binary::{BinaryReader, BinaryWriter};
use crate::error::DecodeError;
use mirror_core::{AppSnapshot, DynamicValue, Filter, FilterChain, Settings, WatchConfig};

/// On-disk format version number
pub type FormatVersion = i64;

pub const START: char = '[';
pub const END: char = ']';
pub const SWITCH: char = '.';
pub const EOF: char = '#';

const EXCLUDE_NAME_TAG: &str = "EFF";
const EXCLUDE_PATH_TAG: &str = "EF";
const INCLUDE_TAG: &str = "IF";

/// Encoder/decoder for one format version
pub trait SnapshotCodec: Send + Sync {
    /// Version this codec reads and writes
    fn version(&self) -> FormatVersion;

    /// Write the payload (everything after header and version)
    fn encode(&self, snapshot: &AppSnapshot, writer: &mut BinaryWriter);

    /// Read a payload written by [`SnapshotCodec::encode`]
    fn decode(&self, reader: &mut BinaryReader<'_>) -> Result<AppSnapshot, DecodeError>;
}

pub(crate) fn expect_marker(
    reader: &mut BinaryReader<'_>,
    marker: char,
    expected: &'static str,
) -> Result<(), DecodeError> {
    let found = reader.read_char()?;
    if found != marker {
        return Err(DecodeError::BadMarker { expected, found });
    }
    Ok(())
}

/// Write every watch framed by START/END, then the SWITCH marker
pub(crate) fn write_watches<F>(writer: &mut BinaryWriter, watches: &[WatchConfig], mut body: F)
where
    F: FnMut(&mut BinaryWriter, &WatchConfig),
{
    for watch in watches {
        writer.write_char(START);
        body(writer, watch);
        writer.write_char(END);
    }
    writer.write_char(SWITCH);
}

/// Read START/END framed watches up to and including the SWITCH marker
///
/// An empty list is written as a bare SWITCH.
pub(crate) fn read_watches<F>(
    reader: &mut BinaryReader<'_>,
    mut body: F,
) -> Result<Vec<WatchConfig>, DecodeError>
where
    F: FnMut(&mut BinaryReader<'_>) -> Result<WatchConfig, DecodeError>,
{
    let mut watches = Vec::new();

    let mut next = reader.read_char()?;
    while next != SWITCH {
        if next != START {
            return Err(DecodeError::BadMarker {
                expected: "start",
                found: next,
            });
        }
        watches.push(body(reader)?);
        expect_marker(reader, END, "end")?;
        next = reader.read_char()?;
    }

    Ok(watches)
}

/// Write settings entries and the EOF marker
pub(crate) fn write_settings(writer: &mut BinaryWriter, settings: &Settings, entry_end: bool) {
    for (key, value) in settings.iter() {
        writer.write_char(START);
        writer.write_string(key);
        write_value(writer, value);
        if entry_end {
            writer.write_char(END);
        }
    }
    writer.write_char(EOF);
}

/// Read settings entries up to and including the EOF marker
pub(crate) fn read_settings(
    reader: &mut BinaryReader<'_>,
    entry_end: bool,
) -> Result<Settings, DecodeError> {
    let mut settings = Settings::new();

    let mut next = reader.read_char()?;
    while next != EOF {
        if next != START {
            return Err(DecodeError::BadMarker {
                expected: "start",
                found: next,
            });
        }
        let key = reader.read_string()?;
        let value = read_value(reader)?;
        if entry_end {
            expect_marker(reader, END, "end")?;
        }
        settings.insert(key, value);
        next = reader.read_char()?;
    }

    Ok(settings)
}

fn write_value(writer: &mut BinaryWriter, value: &DynamicValue) {
    match value {
        DynamicValue::Str(s) => {
            writer.write_char('s');
            writer.write_string(s);
        }
        DynamicValue::Int(i) => {
            writer.write_char('i');
            writer.write_i32(*i);
        }
        DynamicValue::Float(d) => {
            writer.write_char('d');
            writer.write_f64(*d);
        }
        DynamicValue::Bool(b) => {
            writer.write_char('b');
            writer.write_bool(*b);
        }
    }
}

fn read_value(reader: &mut BinaryReader<'_>) -> Result<DynamicValue, DecodeError> {
    match reader.read_char()? {
        's' => Ok(DynamicValue::Str(reader.read_string()?)),
        'i' => Ok(DynamicValue::Int(reader.read_i32()?)),
        'd' => Ok(DynamicValue::Float(reader.read_f64()?)),
        'b' => Ok(DynamicValue::Bool(reader.read_bool()?)),
        other => Err(DecodeError::UnknownValueType(other)),
    }
}

/// Count-prefixed filter records: behaviour, type tag, patterns
pub(crate) fn write_filters(writer: &mut BinaryWriter, filters: &FilterChain) {
    writer.write_count(filters.len());
    for filter in filters {
        writer.write_u32(filter.behaviour().tag());
        let tag = match filter {
            Filter::ExcludeName(_) => EXCLUDE_NAME_TAG,
            Filter::ExcludePath(_) => EXCLUDE_PATH_TAG,
            Filter::IncludeOnly(_) => INCLUDE_TAG,
        };
        writer.write_string(tag);
        writer.write_count(filter.patterns().len());
        for pattern in filter.patterns() {
            writer.write_string(pattern);
        }
    }
}

pub(crate) fn read_filters(reader: &mut BinaryReader<'_>) -> Result<FilterChain, DecodeError> {
    let count = reader.read_count()?;
    let mut chain = FilterChain::new();

    for _ in 0..count {
        // Behaviour follows from the type tag
        reader.read_u32()?;
        let tag = reader.read_string()?;
        let patterns = read_patterns(reader)?;
        let filter = match tag.as_str() {
            EXCLUDE_NAME_TAG => Filter::ExcludeName(patterns),
            EXCLUDE_PATH_TAG => Filter::ExcludePath(patterns),
            INCLUDE_TAG => Filter::IncludeOnly(patterns),
            _ => return Err(DecodeError::UnknownFilter(tag)),
        };
        chain.push(filter);
    }

    Ok(chain)
}

fn read_patterns(reader: &mut BinaryReader<'_>) -> Result<Vec<String>, DecodeError> {
    let count = reader.read_count()?;
    // Each pattern needs at least its length byte
    let mut patterns = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        patterns.push(reader.read_string()?);
    }
    Ok(patterns)
}
