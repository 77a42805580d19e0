use anyhow::Result;
use diskinfo_core::{
    now_utc_rfc3339, DeviceError, DiskGeometry, DiskReport, DriveLayout, LayoutStyle, ProbeRow,
    ReportBody, VolumeExtent, REPORT_SCHEMA_VERSION,
};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    report_id: String,
    schema_version: &'static str,
    generated_at_utc: String,
    #[serde(flatten)]
    report: &'a DiskReport,
}

pub fn render_json(report: &DiskReport) -> Result<String> {
    let doc = JsonReport {
        report_id: Uuid::new_v4().to_string(),
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at_utc: now_utc_rfc3339(),
        report,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

pub fn render_text(report: &DiskReport) -> String {
    format!("{}{}", ReportHeader(&report.device_path), TextReport(report))
}

/// Title line naming the device. Printed before the device is opened, so it
/// precedes an open or geometry failure too.
pub struct ReportHeader<'a>(pub &'a str);

impl Display for ReportHeader<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nInformation for disk {}\n", self.0)
    }
}

/// Console rendering of a report body. Sections whose query failed print the
/// operation name and status code in place of their content.
pub struct TextReport<'a>(pub &'a DiskReport);

impl Display for TextReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write_geometry(f, &report.geometry)?;

        match &report.body {
            ReportBody::Layout {
                layout,
                extents,
                dynamic,
            } => {
                writeln!(f, "Drive Layout :\n")?;
                match layout {
                    Ok(layout) => write_layout(f, layout)?,
                    Err(err) => write_error(f, err)?,
                }
                writeln!(f)?;

                writeln!(f, "Volume Disk Extents :\n")?;
                match extents {
                    Ok(extents) => write_extents(f, extents)?,
                    Err(err) => write_error(f, err)?,
                }
                writeln!(f)?;

                match dynamic {
                    Ok(dynamic) => writeln!(f, "Dynamic Volume  = {}", yes_no(*dynamic))?,
                    Err(err) => write_error(f, err)?,
                }
            }
            ReportBody::Probed { rows } => write_probed(f, rows)?,
        }
        Ok(())
    }
}

fn write_geometry(f: &mut Formatter<'_>, geometry: &DiskGeometry) -> fmt::Result {
    writeln!(f, "Disk Properties :\n")?;
    writeln!(f, "Cylinders       = {}", geometry.cylinders)?;
    writeln!(f, "Tracks/cylinder = {}", geometry.tracks_per_cylinder)?;
    writeln!(f, "Sectors/track   = {}", geometry.sectors_per_track)?;
    writeln!(f, "Bytes/sector    = {}", geometry.bytes_per_sector)?;
    writeln!(f, "Media Type      = {}", geometry.media.label())?;
    writeln!(
        f,
        "Disk size       = {} (Bytes) = {} (Gb)",
        geometry.disk_size,
        geometry.disk_size / GIB
    )?;
    writeln!(f, "\n")
}

fn write_layout(f: &mut Formatter<'_>, layout: &DriveLayout) -> fmt::Result {
    writeln!(f, "Partition Style: {}", layout.style.style().label())?;
    match &layout.style {
        LayoutStyle::Mbr {
            signature,
            checksum,
        } => {
            writeln!(f, "Signature       = 0x{:08X}", signature)?;
            writeln!(f, "Checksum        = 0x{:08X}", checksum)?;
        }
        LayoutStyle::Gpt {
            disk_id,
            starting_usable_offset,
            usable_length,
            max_partition_count,
        } => {
            writeln!(f, "Disk ID         = {{{:X}}}", disk_id)?;
            writeln!(f, "Usable offset   = {}", starting_usable_offset)?;
            writeln!(f, "Usable length   = {}", usable_length)?;
            writeln!(f, "Max partitions  = {}", max_partition_count)?;
        }
        LayoutStyle::Raw => {}
    }
    writeln!(f, "Partition Count = {}\n", layout.partitions.len())?;

    writeln!(
        f,
        "Number    {:<20}    Hidden    Boot     Start Offset           Length",
        "Type"
    )?;
    writeln!(
        f,
        "======    {:=<20}    ======    ====    =============    =============",
        ""
    )?;
    for entry in &layout.partitions {
        writeln!(
            f,
            "{:>6}    {:<20}    {:>6}    {:>4}    {:>13}    {:>13}",
            entry.number,
            entry.type_label(),
            flag(entry.hidden()),
            flag(entry.boot()),
            entry.starting_offset,
            entry.length
        )?;
    }
    Ok(())
}

fn write_extents(f: &mut Formatter<'_>, extents: &[VolumeExtent]) -> fmt::Result {
    writeln!(f, "Disk Number     Start Offset           Length")?;
    writeln!(f, "===========    =============    =============")?;
    for extent in extents {
        writeln!(
            f,
            "{:>11}    {:>13}    {:>13}",
            extent.disk_number, extent.starting_offset, extent.length
        )?;
    }
    Ok(())
}

fn write_probed(f: &mut Formatter<'_>, rows: &[ProbeRow]) -> fmt::Result {
    writeln!(f, "List of Partitions:\n")?;
    writeln!(f, "Number    Type     Start Offset           Length")?;
    writeln!(f, "======    ====    =============    =============")?;
    for row in rows {
        match row {
            ProbeRow::Partition(entry) => writeln!(
                f,
                "{:>6}    {:>4}    {:>13}    {:>13}",
                entry.number,
                entry.style().label(),
                entry.starting_offset,
                entry.length
            )?,
            ProbeRow::OpenFailed { index, .. } | ProbeRow::QueryFailed { index, .. } => writeln!(
                f,
                "{:>6}    {:>4}    {:>13}    {:>13}",
                index, "ERROR", -1, -1
            )?,
        }
    }
    Ok(())
}

fn write_error(f: &mut Formatter<'_>, err: &DeviceError) -> fmt::Result {
    writeln!(f, "{}", err)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn flag(value: Option<bool>) -> &'static str {
    value.map(yes_no).unwrap_or("N/A")
}
