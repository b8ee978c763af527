use super::{base_watch, path_string, LEGACY_FILTER};
use crate::binary::{BinaryReader, BinaryWriter};
use crate::codec::{read_settings, read_watches, write_settings, write_watches, FormatVersion, SnapshotCodec};
use crate::error::DecodeError;
use mirror_core::AppSnapshot;

/// First format: no observe flag, settings entries without end marker
pub struct FormatV1;

impl SnapshotCodec for FormatV1 {
    fn version(&self) -> FormatVersion {
        1
    }

    fn encode(&self, snapshot: &AppSnapshot, writer: &mut BinaryWriter) {
        write_watches(writer, &snapshot.watches, |w, watch| {
            w.write_string(&path_string(&watch.watch_dir));
            w.write_string(&path_string(&watch.sync_dir));
            w.write_string(LEGACY_FILTER);
            w.write_bool(watch.recursive);
            w.write_bool(watch.auto_add);
            w.write_bool(watch.auto_delete);
        });
        write_settings(writer, &snapshot.settings, false);
    }

    fn decode(&self, reader: &mut BinaryReader<'_>) -> Result<AppSnapshot, DecodeError> {
        let watches = read_watches(reader, |r| {
            let mut watch = base_watch(r.read_string()?, r.read_string()?);
            r.read_string()?; // legacy filter
            watch.recursive = r.read_bool()?;
            watch.auto_add = r.read_bool()?;
            watch.auto_delete = r.read_bool()?;
            Ok(watch)
        })?;
        let settings = read_settings(reader, false)?;

        Ok(AppSnapshot { watches, settings })
    }
}
