//! Decoders for the fixed-layout buffers returned by the disk and volume
//! device-control codes. Offsets follow the natural alignment of the Win32
//! structures, which is the same on x86 and x64.

use uuid::Uuid;

use crate::classify::partition_style_from_raw;
use crate::error::DecodeError;
use crate::model::{
    DiskGeometry, DriveLayout, LayoutStyle, MediaKind, PartitionEntry, PartitionKind,
    PartitionStyle, VolumeExtent,
};

/// `MEDIA_TYPE::RemovableMedia`
pub const MEDIA_TYPE_REMOVABLE: u32 = 11;

/// `DISK_GEOMETRY_EX` up to and including `DiskSize`.
pub const GEOMETRY_EX_SIZE: usize = 32;
pub const PARTITION_INFO_EX_SIZE: usize = 144;
/// `DRIVE_LAYOUT_INFORMATION_EX` header before the first `PartitionEntry`.
pub const DRIVE_LAYOUT_HEADER_SIZE: usize = 48;
pub const DISK_EXTENT_SIZE: usize = 24;
pub const VOLUME_EXTENTS_HEADER_SIZE: usize = 8;

const GPT_NAME_UNITS: usize = 36;

fn ensure(buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buf.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn read_u64(buf: &[u8], off: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(bytes)
}

/// Reads a `LARGE_INTEGER` offset or length. Negative values are rejected
/// rather than clamped.
fn read_len(buf: &[u8], off: usize) -> Result<u64, DecodeError> {
    let value = read_u64(buf, off) as i64;
    u64::try_from(value).map_err(|_| DecodeError::NegativeLength { offset: off, value })
}

fn read_guid(buf: &[u8], off: usize) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&buf[off..off + 16]);
    Uuid::from_bytes_le(bytes)
}

fn read_utf16_name(buf: &[u8], off: usize) -> String {
    let units: Vec<u16> = buf[off..off + GPT_NAME_UNITS * 2]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

pub fn decode_geometry(buf: &[u8]) -> Result<DiskGeometry, DecodeError> {
    ensure(buf, GEOMETRY_EX_SIZE)?;
    let media = if read_u32(buf, 8) == MEDIA_TYPE_REMOVABLE {
        MediaKind::Removable
    } else {
        MediaKind::Fixed
    };
    Ok(DiskGeometry {
        cylinders: read_len(buf, 0)?,
        tracks_per_cylinder: read_u32(buf, 12),
        sectors_per_track: read_u32(buf, 16),
        bytes_per_sector: read_u32(buf, 20),
        media,
        disk_size: read_len(buf, 24)?,
    })
}

/// Decodes one `PARTITION_INFORMATION_EX` record.
pub fn decode_partition_info(buf: &[u8]) -> Result<PartitionEntry, DecodeError> {
    ensure(buf, PARTITION_INFO_EX_SIZE)?;
    let raw_style = read_u32(buf, 0);
    let style = partition_style_from_raw(raw_style).ok_or(DecodeError::UnknownStyle(raw_style))?;

    let kind = match style {
        PartitionStyle::Mbr => PartitionKind::Mbr {
            type_code: buf[32],
            boot: buf[33] != 0,
            recognized: buf[34] != 0,
            hidden_sectors: read_u32(buf, 36),
        },
        PartitionStyle::Gpt => PartitionKind::Gpt {
            type_id: read_guid(buf, 32),
            partition_id: read_guid(buf, 48),
            attributes: read_u64(buf, 64),
            name: read_utf16_name(buf, 72),
        },
        PartitionStyle::Raw => PartitionKind::Raw,
    };

    Ok(PartitionEntry {
        number: read_u32(buf, 24),
        starting_offset: read_len(buf, 8)?,
        length: read_len(buf, 16)?,
        kind,
    })
}

/// Decodes `DRIVE_LAYOUT_INFORMATION_EX`. Slots without a partition number
/// (unused MBR slots and extended containers) are dropped.
pub fn decode_drive_layout(buf: &[u8]) -> Result<DriveLayout, DecodeError> {
    ensure(buf, DRIVE_LAYOUT_HEADER_SIZE)?;
    let raw_style = read_u32(buf, 0);
    let count = read_u32(buf, 4) as usize;

    let style = match partition_style_from_raw(raw_style) {
        Some(PartitionStyle::Mbr) => LayoutStyle::Mbr {
            signature: read_u32(buf, 8),
            checksum: read_u32(buf, 12),
        },
        Some(PartitionStyle::Gpt) => LayoutStyle::Gpt {
            disk_id: read_guid(buf, 8),
            starting_usable_offset: read_len(buf, 24)?,
            usable_length: read_len(buf, 32)?,
            max_partition_count: read_u32(buf, 40),
        },
        Some(PartitionStyle::Raw) => LayoutStyle::Raw,
        None => return Err(DecodeError::UnknownStyle(raw_style)),
    };

    let needed = count
        .checked_mul(PARTITION_INFO_EX_SIZE)
        .and_then(|entries| entries.checked_add(DRIVE_LAYOUT_HEADER_SIZE))
        .unwrap_or(usize::MAX);
    ensure(buf, needed)?;

    let mut partitions = Vec::with_capacity(count);
    for idx in 0..count {
        let start = DRIVE_LAYOUT_HEADER_SIZE + idx * PARTITION_INFO_EX_SIZE;
        let entry = decode_partition_info(&buf[start..start + PARTITION_INFO_EX_SIZE])?;
        if entry.number != 0 {
            partitions.push(entry);
        }
    }

    Ok(DriveLayout { style, partitions })
}

/// Number of extents announced by a `VOLUME_DISK_EXTENTS` header.
pub fn extent_count(buf: &[u8]) -> Result<usize, DecodeError> {
    ensure(buf, 4)?;
    Ok(read_u32(buf, 0) as usize)
}

pub fn decode_volume_extents(buf: &[u8]) -> Result<Vec<VolumeExtent>, DecodeError> {
    let count = extent_count(buf)?;
    let needed = count
        .checked_mul(DISK_EXTENT_SIZE)
        .and_then(|extents| extents.checked_add(VOLUME_EXTENTS_HEADER_SIZE))
        .unwrap_or(usize::MAX);
    ensure(buf, needed)?;

    (0..count)
        .map(|idx| {
            let off = VOLUME_EXTENTS_HEADER_SIZE + idx * DISK_EXTENT_SIZE;
            Ok(VolumeExtent {
                disk_number: read_u32(buf, off),
                starting_offset: read_len(buf, off + 8)?,
                length: read_len(buf, off + 16)?,
            })
        })
        .collect()
}

/// Required output size for a layout holding `count` partition records.
pub fn drive_layout_size(count: usize) -> usize {
    DRIVE_LAYOUT_HEADER_SIZE + count * PARTITION_INFO_EX_SIZE
}

pub fn volume_extents_size(count: usize) -> usize {
    VOLUME_EXTENTS_HEADER_SIZE + count * DISK_EXTENT_SIZE
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Little-endian buffer builders matching the Win32 layouts.

    use super::*;

    pub fn put_u32(buf: &mut [u8], off: usize, value: u32) {
        buf[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(buf: &mut [u8], off: usize, value: u64) {
        buf[off..off + 8].copy_from_slice(&value.to_le_bytes());
    }

    pub fn put_guid(buf: &mut [u8], off: usize, id: Uuid) {
        buf[off..off + 16].copy_from_slice(&id.to_bytes_le());
    }

    pub fn geometry(bytes_per_sector: u32, media: u32, disk_size: u64) -> Vec<u8> {
        let mut buf = vec![0u8; GEOMETRY_EX_SIZE];
        put_u64(&mut buf, 0, disk_size / (255 * 63 * bytes_per_sector as u64));
        put_u32(&mut buf, 8, media);
        put_u32(&mut buf, 12, 255);
        put_u32(&mut buf, 16, 63);
        put_u32(&mut buf, 20, bytes_per_sector);
        put_u64(&mut buf, 24, disk_size);
        buf
    }

    pub fn mbr_partition(number: u32, type_code: u8, offset: u64, length: u64) -> Vec<u8> {
        let mut buf = vec![0u8; PARTITION_INFO_EX_SIZE];
        put_u32(&mut buf, 0, 0);
        put_u64(&mut buf, 8, offset);
        put_u64(&mut buf, 16, length);
        put_u32(&mut buf, 24, number);
        buf[32] = type_code;
        buf[33] = u8::from(number == 1);
        buf[34] = 1;
        put_u32(&mut buf, 36, (offset / 512) as u32);
        buf
    }

    pub fn gpt_partition(number: u32, type_id: Uuid, name: &str, attributes: u64) -> Vec<u8> {
        let mut buf = vec![0u8; PARTITION_INFO_EX_SIZE];
        put_u32(&mut buf, 0, 1);
        put_u64(&mut buf, 8, number as u64 * 1_048_576);
        put_u64(&mut buf, 16, 1_048_576);
        put_u32(&mut buf, 24, number);
        put_guid(&mut buf, 32, type_id);
        put_guid(&mut buf, 48, Uuid::from_u128(number as u128));
        put_u64(&mut buf, 64, attributes);
        for (idx, unit) in name.encode_utf16().take(36).enumerate() {
            buf[72 + idx * 2..74 + idx * 2].copy_from_slice(&unit.to_le_bytes());
        }
        buf
    }

    pub fn mbr_layout(signature: u32, entries: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = vec![0u8; DRIVE_LAYOUT_HEADER_SIZE];
        put_u32(&mut buf, 0, 0);
        put_u32(&mut buf, 4, entries.len() as u32);
        put_u32(&mut buf, 8, signature);
        for entry in entries {
            buf.extend_from_slice(entry);
        }
        buf
    }

    pub fn gpt_layout(disk_id: Uuid, entries: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = vec![0u8; DRIVE_LAYOUT_HEADER_SIZE];
        put_u32(&mut buf, 0, 1);
        put_u32(&mut buf, 4, entries.len() as u32);
        put_guid(&mut buf, 8, disk_id);
        put_u64(&mut buf, 24, 17_408);
        put_u64(&mut buf, 32, 500_107_829_248);
        put_u32(&mut buf, 40, 128);
        for entry in entries {
            buf.extend_from_slice(entry);
        }
        buf
    }

    pub fn extents(items: &[(u32, u64, u64)]) -> Vec<u8> {
        let mut buf = vec![0u8; volume_extents_size(items.len())];
        put_u32(&mut buf, 0, items.len() as u32);
        for (idx, (disk, offset, length)) in items.iter().enumerate() {
            let off = VOLUME_EXTENTS_HEADER_SIZE + idx * DISK_EXTENT_SIZE;
            put_u32(&mut buf, off, *disk);
            put_u64(&mut buf, off + 8, *offset);
            put_u64(&mut buf, off + 16, *length);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const BASIC_DATA: u128 = 0xEBD0A0A2_B9E5_4433_87C0_68B6B72699C7;

    #[test]
    fn geometry_fields() {
        let buf = geometry(512, 12, 256_060_514_304);
        let geometry = decode_geometry(&buf).unwrap();
        assert_eq!(geometry.bytes_per_sector, 512);
        assert_eq!(geometry.tracks_per_cylinder, 255);
        assert_eq!(geometry.sectors_per_track, 63);
        assert_eq!(geometry.disk_size, 256_060_514_304);
        assert_eq!(geometry.cylinders, 31_130);
        assert_eq!(geometry.media, MediaKind::Fixed);

        let removable = decode_geometry(&geometry_buf_removable()).unwrap();
        assert_eq!(removable.media, MediaKind::Removable);
    }

    fn geometry_buf_removable() -> Vec<u8> {
        geometry(512, MEDIA_TYPE_REMOVABLE, 16_000_000_000)
    }

    #[test]
    fn geometry_rejects_short_buffer() {
        assert_eq!(
            decode_geometry(&[0u8; 24]),
            Err(DecodeError::Truncated {
                needed: GEOMETRY_EX_SIZE,
                actual: 24
            })
        );
    }

    #[test]
    fn mbr_layout_skips_unused_slots() {
        let buf = mbr_layout(
            0xA1B2_C3D4,
            &[
                mbr_partition(1, 0x07, 1_048_576, 524_288_000),
                mbr_partition(2, 0x07, 525_336_576, 100_000_000_000),
                mbr_partition(0, 0x00, 0, 0),
                mbr_partition(0, 0x00, 0, 0),
            ],
        );
        let layout = decode_drive_layout(&buf).unwrap();
        assert_eq!(
            layout.style,
            LayoutStyle::Mbr {
                signature: 0xA1B2_C3D4,
                checksum: 0
            }
        );
        let numbers: Vec<u32> = layout.partitions.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(layout.partitions[1].starting_offset, 525_336_576);
        assert_eq!(layout.partitions[0].boot(), Some(true));
        assert_eq!(layout.partitions[1].boot(), Some(false));
    }

    #[test]
    fn gpt_layout_and_names() {
        let disk_id = Uuid::parse_str("6f2c1c3e-8d3e-4b8a-9a4e-1f0f2f3a4b5c").unwrap();
        let buf = gpt_layout(
            disk_id,
            &[gpt_partition(1, Uuid::from_u128(BASIC_DATA), "Basic data partition", 0)],
        );
        let layout = decode_drive_layout(&buf).unwrap();
        match &layout.style {
            LayoutStyle::Gpt {
                disk_id: decoded,
                starting_usable_offset,
                max_partition_count,
                ..
            } => {
                assert_eq!(*decoded, disk_id);
                assert_eq!(*starting_usable_offset, 17_408);
                assert_eq!(*max_partition_count, 128);
            }
            other => panic!("unexpected style {other:?}"),
        }
        let entry = &layout.partitions[0];
        assert_eq!(entry.type_label(), "Basic data");
        match &entry.kind {
            PartitionKind::Gpt { name, .. } => assert_eq!(name, "Basic data partition"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn guid_uses_mixed_endian_layout() {
        let mut buf = vec![0u8; PARTITION_INFO_EX_SIZE];
        put_u32(&mut buf, 0, 1);
        put_u32(&mut buf, 24, 1);
        // C12A7328-F81F-11D2-BA4B-00A0C93EC93B as laid out in memory
        buf[32..48].copy_from_slice(&[
            0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11, 0xBA, 0x4B, 0x00, 0xA0, 0xC9, 0x3E,
            0xC9, 0x3B,
        ]);
        let entry = decode_partition_info(&buf).unwrap();
        assert_eq!(entry.type_label(), "EFI system");
    }

    #[test]
    fn layout_count_beyond_buffer_is_rejected() {
        let mut buf = mbr_layout(1, &[mbr_partition(1, 0x0B, 0, 0)]);
        put_u32(&mut buf, 4, 4);
        assert!(matches!(
            decode_drive_layout(&buf),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn unknown_style_is_rejected() {
        let mut buf = vec![0u8; DRIVE_LAYOUT_HEADER_SIZE];
        put_u32(&mut buf, 0, 9);
        assert_eq!(decode_drive_layout(&buf), Err(DecodeError::UnknownStyle(9)));
    }

    #[test]
    fn raw_partition_info() {
        let mut buf = vec![0u8; PARTITION_INFO_EX_SIZE];
        put_u32(&mut buf, 0, 2);
        put_u32(&mut buf, 24, 3);
        put_u64(&mut buf, 16, 4096);
        let entry = decode_partition_info(&buf).unwrap();
        assert_eq!(entry.kind, PartitionKind::Raw);
        assert_eq!(entry.number, 3);
        assert_eq!(entry.length, 4096);
    }

    #[test]
    fn negative_lengths_are_rejected() {
        let mut buf = mbr_partition(1, 0x07, 1_048_576, 4096);
        put_u64(&mut buf, 16, (-1i64) as u64);
        assert_eq!(
            decode_partition_info(&buf),
            Err(DecodeError::NegativeLength {
                offset: 16,
                value: -1
            })
        );

        let mut buf = extents(&[(0, 1_048_576, 524_288_000)]);
        put_u64(&mut buf, VOLUME_EXTENTS_HEADER_SIZE + 8, i64::MIN as u64);
        assert!(matches!(
            decode_volume_extents(&buf),
            Err(DecodeError::NegativeLength { value: i64::MIN, .. })
        ));
    }

    #[test]
    fn volume_extents() {
        let buf = extents(&[(0, 1_048_576, 524_288_000), (2, 0, 1_000_000)]);
        let decoded = decode_volume_extents(&buf).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(
            decoded[1],
            VolumeExtent {
                disk_number: 2,
                starting_offset: 0,
                length: 1_000_000
            }
        );

        let truncated = &buf[..volume_extents_size(1)];
        assert!(decode_volume_extents(truncated).is_err());
        assert_eq!(extent_count(truncated).unwrap(), 2);
    }
}
