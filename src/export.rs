//! JSON and CSV exports of block analyses for external plotting.

use std::io::Write;

use crate::analysis::BlockAnalysis;
use crate::error::{Result, ShredscopeError};

const CSV_HEADER: [&str; 7] = [
    "block_id",
    "kind",
    "fec_set_id",
    "fragment_id",
    "timestamp_us",
    "cumulative",
    "channel",
];

/// Write `analyses` as a pretty-printed JSON array followed by a newline.
pub fn write_json<W: Write>(mut writer: W, analyses: &[BlockAnalysis]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, analyses)
        .map_err(|e| ShredscopeError::Export(e.to_string()))?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write one CSV row per timeline point, duplicate arrival and ready point.
/// `kind` is `timeline`, `duplicate` or `ready`; columns that do not apply
/// to a kind are left empty.
pub fn write_csv<W: Write>(writer: W, analyses: &[BlockAnalysis]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| ShredscopeError::Export(e.to_string());
    wtr.write_record(CSV_HEADER).map_err(csv_err)?;

    for analysis in analyses {
        let block = analysis.block_id.to_string();
        for (fec_set_id, timeline) in &analysis.timelines {
            for point in timeline.points() {
                wtr.write_record([
                    block.as_str(),
                    "timeline",
                    &fec_set_id.to_string(),
                    "",
                    &point.timestamp.as_micros().to_string(),
                    &point.cumulative.to_string(),
                    "",
                ])
                .map_err(csv_err)?;
            }
        }
        for (key, record) in &analysis.duplicates {
            for arrival in &record.arrivals {
                wtr.write_record([
                    block.as_str(),
                    "duplicate",
                    &key.fec_set_id.to_string(),
                    &key.fragment_id.to_string(),
                    &arrival.timestamp.as_micros().to_string(),
                    &arrival.cumulative.to_string(),
                    arrival.channel.tag(),
                ])
                .map_err(csv_err)?;
            }
        }
        for point in &analysis.ready_points {
            wtr.write_record([
                block.as_str(),
                "ready",
                &point.fec_set_id.to_string(),
                "",
                &point.timestamp.as_micros().to_string(),
                &point.cumulative.to_string(),
                "",
            ])
            .map_err(csv_err)?;
        }
    }
    wtr.flush()?;
    Ok(())
}
