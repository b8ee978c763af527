//! Version -> codec lookup
//!
//! File layout: 4 header bytes, the format version as i64 little-endian,
//! then the payload of the codec registered for that version. Older codecs
//! stay registered so files from earlier releases still load; the next save
//! rewrites them in the current version.

use crate::binary::{BinaryReader, BinaryWriter};
use crate::codec::{FormatVersion, SnapshotCodec};
use crate::error::InvalidStore;
use crate::formats::{FormatV1, FormatV2, FormatV3, FormatV4};
use mirror_core::AppSnapshot;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Magic bytes at the start of every snapshot file
pub const HEADER: [u8; 4] = [0x04, b'j', b'w', 0x23];

/// Version written by [`FormatRegistry::encode`]
pub const CURRENT_VERSION: FormatVersion = 4;

/// Every codec shipped with this build
fn builtin_codecs() -> Vec<Box<dyn SnapshotCodec>> {
    vec![
        Box::new(FormatV1),
        Box::new(FormatV2),
        Box::new(FormatV3),
        Box::new(FormatV4),
    ]
}

/// Maps format versions to codecs
pub struct FormatRegistry {
    codecs: BTreeMap<FormatVersion, Box<dyn SnapshotCodec>>,
    current: FormatVersion,
}

impl FormatRegistry {
    /// Registry without codecs
    pub fn empty(current: FormatVersion) -> Self {
        Self {
            codecs: BTreeMap::new(),
            current,
        }
    }

    /// Registry with every built-in codec, writing [`CURRENT_VERSION`]
    pub fn builtin() -> Self {
        let mut registry = Self::empty(CURRENT_VERSION);
        for codec in builtin_codecs() {
            registry.register(codec);
        }
        registry
    }

    /// Write a different version on save
    pub fn with_current_version(mut self, version: FormatVersion) -> Self {
        self.current = version;
        self
    }

    /// Add or replace the codec for its version
    pub fn register(&mut self, codec: Box<dyn SnapshotCodec>) {
        self.codecs.insert(codec.version(), codec);
    }

    pub fn get(&self, version: FormatVersion) -> Option<&dyn SnapshotCodec> {
        self.codecs.get(&version).map(|c| c.as_ref())
    }

    pub fn current_version(&self) -> FormatVersion {
        self.current
    }

    /// Registered versions in ascending order
    pub fn versions(&self) -> Vec<FormatVersion> {
        self.codecs.keys().copied().collect()
    }

    /// Header, version and payload for `snapshot`
    ///
    /// Without a codec for the current version only header and version are
    /// written; such a file fails to load and is discarded.
    pub fn encode(&self, snapshot: &AppSnapshot) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_bytes(&HEADER);
        writer.write_i64(self.current);

        match self.get(self.current) {
            Some(codec) => codec.encode(snapshot, &mut writer),
            None => error!(
                "No codec registered for current format version {}, writing header only",
                self.current
            ),
        }

        writer.into_vec()
    }

    /// Parse a whole snapshot file
    pub fn decode(&self, bytes: &[u8]) -> Result<AppSnapshot, InvalidStore> {
        let mut reader = BinaryReader::new(bytes);

        let header = reader.read_bytes(HEADER.len()).map_err(|_| InvalidStore::Header)?;
        if header != HEADER {
            return Err(InvalidStore::Header);
        }

        let version = reader.read_i64()?;
        let codec = self.get(version).ok_or(InvalidStore::Unsupported(version))?;
        debug!("Decoding snapshot with format version {}", version);

        Ok(codec.decode(&mut reader)?)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
