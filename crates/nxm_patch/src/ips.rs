//! Binary-offset patch decoding (IPS and IPS32).
//!
//! Both layouts share the record loop: a big-endian offset, a 16-bit size,
//! and either literal bytes or an RLE run (size 0, then count and fill byte).
//! The classic layout uses 3-byte offsets terminated by `EOF`; the 32-bit
//! layout uses 4-byte offsets terminated by `EEOF`. Which one a file uses is
//! an internal detail; callers just get a [`PatchSet`].

use crate::{Error, PatchEdit, PatchSet, Result};
use byteorder::{ReadBytesExt, BE};
use std::io::Read;

enum IpsFormat {
    Ips,
    Ips32,
}

/// Decode an IPS or IPS32 patch stream into a [`PatchSet`].
///
/// Truncated or otherwise malformed streams yield an error; the caller
/// discards the whole file rather than applying a partial record list.
pub fn decode_ips<R: Read>(reader: &mut R) -> Result<PatchSet> {
    let mut magic = [0u8; 5];
    reader.read_exact(&mut magic)?;

    let format = match &magic {
        b"PATCH" => IpsFormat::Ips,
        b"IPS32" => IpsFormat::Ips32,
        _ => return Err(Error::InvalidIpsMagic(magic)),
    };

    let mut set = PatchSet::new();
    loop {
        let offset = match format {
            IpsFormat::Ips => {
                let mut buf = [0u8; 3];
                reader.read_exact(&mut buf)?;
                if &buf == b"EOF" {
                    break;
                }
                u32::from_be_bytes([0, buf[0], buf[1], buf[2]])
            }
            IpsFormat::Ips32 => {
                let mut buf = [0u8; 4];
                reader.read_exact(&mut buf)?;
                if &buf == b"EEOF" {
                    break;
                }
                u32::from_be_bytes(buf)
            }
        };

        let size = reader.read_u16::<BE>()?;
        let bytes = if size == 0 {
            // RLE record: repeat count followed by the fill byte
            let count = reader.read_u16::<BE>()?;
            let value = reader.read_u8()?;
            vec![value; count as usize]
        } else {
            let mut bytes = vec![0u8; size as usize];
            reader.read_exact(&mut bytes)?;
            bytes
        };

        set.push(PatchEdit { offset, bytes });
    }

    Ok(set)
}
