use binrw::BinRead;
use byteorder::{ReadBytesExt, LE};
use std::{
    collections::HashMap,
    io::{BufReader, Read, Seek, SeekFrom},
};

use crate::{entry::PackEntry, error::PackError, Pack};

impl<TSource: Read + Seek> Pack<TSource> {
    const MAGIC: [u8; 8] = *b"_nxpack_";
    const VERSION: u32 = 1;

    /// Mount a pack from a reader, parsing the header and table of contents.
    ///
    /// Entry data is not read; it is loaded lazily through
    /// [`load_entry`](Pack::load_entry).
    pub fn mount_from_reader(mut source: TSource) -> Result<Self, PackError> {
        source.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(&mut source);

        let magic = reader.read_u64::<LE>()?;
        if magic != u64::from_le_bytes(Self::MAGIC) {
            return Err(PackError::InvalidMagic(magic));
        }

        let version = reader.read_u32::<LE>()?;
        if version != Self::VERSION {
            return Err(PackError::InvalidVersion(version));
        }

        let entry_count = reader.read_u32::<LE>()?;

        let paths = read_paths(&mut reader)?;

        // Skip alignment
        let position = reader.stream_position()?;
        reader.seek(SeekFrom::Current(((8 - (position % 8)) % 8) as i64))?;

        let mut entries = HashMap::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let entry = PackEntry::read(&mut reader)?;
            let path = paths.get(entry.path_index as usize).ok_or(
                PackError::InvalidPathIndex {
                    index: entry.path_index,
                    count: paths.len() as u32,
                },
            )?;
            entries.insert(path.clone(), entry);
        }

        drop(reader);

        Ok(Self {
            paths,
            entries,
            source,
        })
    }
}

fn read_paths<R: Read>(reader: &mut R) -> Result<Vec<String>, PackError> {
    let count = reader.read_u32::<LE>()?;
    let mut paths = Vec::with_capacity(count as usize);
    for _ in 0..count {
        paths.push(read_nul_terminated(reader)?);
    }
    Ok(paths)
}

fn read_nul_terminated<R: Read>(reader: &mut R) -> Result<String, PackError> {
    let mut bytes = Vec::new();
    loop {
        let byte = reader.read_u8()?;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }
    Ok(String::from_utf8(bytes)?)
}
