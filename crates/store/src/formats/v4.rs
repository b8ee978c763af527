use super::{base_watch, path_string};
use crate::binary::{BinaryReader, BinaryWriter};
use crate::codec::{
    read_filters, read_settings, read_watches, write_filters, write_settings, write_watches,
    FormatVersion, SnapshotCodec,
};
use crate::error::DecodeError;
use mirror_core::AppSnapshot;

/// Current format: every `WatchConfig` field round-trips
pub struct FormatV4;

impl SnapshotCodec for FormatV4 {
    fn version(&self) -> FormatVersion {
        4
    }

    fn encode(&self, snapshot: &AppSnapshot, writer: &mut BinaryWriter) {
        write_watches(writer, &snapshot.watches, |w, watch| {
            w.write_string(&watch.name);
            w.write_string(&path_string(&watch.watch_dir));
            w.write_string(&path_string(&watch.sync_dir));
            write_filters(w, &watch.filters);
            w.write_bool(watch.recursive);
            w.write_bool(watch.auto_add);
            w.write_bool(watch.auto_delete);
            w.write_bool(watch.observe);
            w.write_u32(watch.delay_ms);
        });
        write_settings(writer, &snapshot.settings, true);
    }

    fn decode(&self, reader: &mut BinaryReader<'_>) -> Result<AppSnapshot, DecodeError> {
        let watches = read_watches(reader, |r| {
            let name = r.read_string()?;
            let mut watch = base_watch(r.read_string()?, r.read_string()?);
            watch.name = name;
            watch.filters = read_filters(r)?;
            watch.recursive = r.read_bool()?;
            watch.auto_add = r.read_bool()?;
            watch.auto_delete = r.read_bool()?;
            watch.observe = r.read_bool()?;
            watch.delay_ms = r.read_u32()?;
            Ok(watch)
        })?;
        let settings = read_settings(reader, true)?;

        Ok(AppSnapshot { watches, settings })
    }
}
