use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Highest partition sub-device index probed on a physical drive.
pub const MAX_PARTITION_PROBES: u32 = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("invalid argument '{0}': expected a physical drive number or a drive letter")]
    Malformed(String),
}

/// Physical drive number kept as normalized decimal digits, so any digit
/// count resolves without overflow. Existence is discovered at open time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DriveIndex(String);

impl DriveIndex {
    fn from_digits(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            DriveIndex("0".to_string())
        } else {
            DriveIndex(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for DriveIndex {
    fn from(value: u32) -> Self {
        DriveIndex(value.to_string())
    }
}

impl fmt::Display for DriveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DriveLetter(char);

impl DriveLetter {
    pub fn new(letter: char) -> Option<Self> {
        if letter.is_ascii_alphabetic() {
            Some(DriveLetter(letter.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for DriveLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Target {
    PhysicalDrive(DriveIndex),
    Volume(DriveLetter),
}

impl Target {
    pub fn device_path(&self) -> String {
        match self {
            Target::PhysicalDrive(index) => format!(r"\\.\PhysicalDrive{}", index),
            Target::Volume(letter) => format!(r"\\.\{}:", letter.as_char()),
        }
    }

    pub fn drive_index(&self) -> Option<&DriveIndex> {
        match self {
            Target::PhysicalDrive(index) => Some(index),
            Target::Volume(_) => None,
        }
    }
}

/// Classifies a single command-line token as a drive number or a drive letter.
pub fn resolve_target(token: &str) -> Result<Target, TargetError> {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Target::PhysicalDrive(DriveIndex::from_digits(token)));
    }

    let mut chars = token.chars();
    let letter = match (chars.next(), chars.next(), chars.next()) {
        (Some(first), None, None) => DriveLetter::new(first),
        (Some(first), Some(':'), None) => DriveLetter::new(first),
        _ => None,
    };

    letter
        .map(Target::Volume)
        .ok_or_else(|| TargetError::Malformed(token.to_string()))
}

pub fn partition_device_path(disk: &DriveIndex, partition: u32) -> String {
    format!(
        r"\\?\GLOBALROOT\Device\Harddisk{}\Partition{}",
        disk, partition
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_resolve_to_drive_index() {
        assert_eq!(
            resolve_target("0").unwrap(),
            Target::PhysicalDrive(DriveIndex::from(0))
        );
        assert_eq!(
            resolve_target("12").unwrap(),
            Target::PhysicalDrive(DriveIndex::from(12))
        );
    }

    #[test]
    fn leading_zeros_are_normalized() {
        assert_eq!(
            resolve_target("007").unwrap(),
            Target::PhysicalDrive(DriveIndex::from(7))
        );
        assert_eq!(
            resolve_target("000").unwrap(),
            Target::PhysicalDrive(DriveIndex::from(0))
        );
    }

    #[test]
    fn long_digit_strings_are_accepted() {
        let token = "123456789012345678901234567890";
        let target = resolve_target(token).unwrap();
        assert_eq!(target.drive_index().unwrap().as_str(), token);
    }

    #[test]
    fn letter_forms_normalize_identically() {
        let expected = Target::Volume(DriveLetter::new('C').unwrap());
        for token in ["c", "C", "c:", "C:"] {
            assert_eq!(resolve_target(token).unwrap(), expected, "token {token}");
        }
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["", "1a", "@", "C:\\", "CD", ":", "1:", "é", "c::"] {
            assert!(
                matches!(resolve_target(token), Err(TargetError::Malformed(_))),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn builds_device_paths() {
        let drive = resolve_target("3").unwrap();
        assert_eq!(drive.device_path(), r"\\.\PhysicalDrive3");
        assert_eq!(drive.device_path(), resolve_target("03").unwrap().device_path());

        let volume = resolve_target("z").unwrap();
        assert_eq!(volume.device_path(), r"\\.\Z:");
        assert!(volume.drive_index().is_none());
    }

    #[test]
    fn builds_partition_paths() {
        assert_eq!(
            partition_device_path(&DriveIndex::from(1), 4),
            r"\\?\GLOBALROOT\Device\Harddisk1\Partition4"
        );
    }
}
