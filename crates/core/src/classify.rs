//! Static lookup tables from raw partition-type identifiers to display labels.

use uuid::Uuid;

use crate::model::PartitionStyle;

pub const UNKNOWN_LABEL: &str = "N/A";

/// Legacy MBR partition type codes known to Windows.
pub const MBR_TYPES: &[(u8, &str)] = &[
    (0x00, "Unused"),
    (0x01, "FAT12"),
    (0x02, "XENIX root"),
    (0x03, "XENIX usr"),
    (0x04, "FAT16 (<32MB)"),
    (0x05, "Extended"),
    (0x06, "FAT16 (huge)"),
    (0x07, "NTFS/exFAT (IFS)"),
    (0x0A, "OS/2 Boot Manager"),
    (0x0B, "FAT32"),
    (0x0C, "FAT32 (LBA)"),
    (0x0E, "FAT16 (LBA)"),
    (0x0F, "Extended (LBA)"),
    (0x11, "Hidden FAT12"),
    (0x14, "Hidden FAT16 (<32MB)"),
    (0x16, "Hidden FAT16 (huge)"),
    (0x17, "Hidden NTFS/exFAT"),
    (0x1B, "Hidden FAT32"),
    (0x1C, "Hidden FAT32 (LBA)"),
    (0x1E, "Hidden FAT16 (LBA)"),
    (0x27, "Microsoft recovery"),
    (0x28, "Main OS"),
    (0x29, "OS data"),
    (0x2A, "Pre-installed"),
    (0x2B, "BSP"),
    (0x2C, "DPP"),
    (0x2D, "Windows system"),
    (0x41, "PowerPC PReP boot"),
    (0x42, "LDM (dynamic disk)"),
    (0x54, "Disk Manager"),
    (0x55, "EZ-Drive"),
    (0x63, "Unix"),
    (0x82, "Linux swap"),
    (0x83, "Linux"),
    (0x8E, "Linux LVM"),
    (0xA5, "FreeBSD"),
    (0xA8, "Apple UFS"),
    (0xAF, "Apple HFS+"),
    (0xC0, "NTFT"),
    (0xD7, "Storage Spaces data"),
    (0xE7, "Storage Spaces"),
    (0xEE, "GPT protective"),
    (0xEF, "EFI system"),
];

/// Well-known GPT partition type GUIDs used by Windows.
pub const GPT_TYPES: &[(u128, &str)] = &[
    (0x00000000_0000_0000_0000_000000000000, "Unused"),
    (0xEBD0A0A2_B9E5_4433_87C0_68B6B72699C7, "Basic data"),
    (0xC12A7328_F81F_11D2_BA4B_00A0C93EC93B, "EFI system"),
    (0xE3C9E316_0B5C_4DB8_817D_F92DF00215AE, "Microsoft reserved"),
    (0x5808C8AA_7E8F_42E0_85D2_E1E90434CFB3, "LDM metadata"),
    (0xAF9B60A0_1431_4F62_BC68_3311714A69AD, "LDM data"),
    (0xDE94BBA4_06D1_4D40_A16A_BFD50179D6AC, "Microsoft recovery"),
];

pub fn mbr_type_label(code: u8) -> &'static str {
    MBR_TYPES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_LABEL)
}

pub fn gpt_type_label(type_id: &Uuid) -> &'static str {
    let value = type_id.as_u128();
    GPT_TYPES
        .iter()
        .find(|(known, _)| *known == value)
        .map(|(_, label)| *label)
        .unwrap_or(UNKNOWN_LABEL)
}

pub fn partition_style_from_raw(raw: u32) -> Option<PartitionStyle> {
    match raw {
        0 => Some(PartitionStyle::Mbr),
        1 => Some(PartitionStyle::Gpt),
        2 => Some(PartitionStyle::Raw),
        _ => None,
    }
}
