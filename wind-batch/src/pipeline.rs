//! Per-file decode pipeline: capture lines to merged wind CSV.
//!
//! Three streams come out of one capture: position fixes (DF17 airborne
//! position, resolved per time bucket and aircraft), BDS 5,0 track/speed
//! records and BDS 6,0 heading/speed records (classified DF20/21). The
//! streams inner-merge on (time bucket, ICAO); each merged row carries the
//! wind vector implied by its ground and air velocities.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use wind_core::altitude::surveillance_altitude;
use wind_core::bds::classify;
use wind_core::cpr::resolve_batch;
use wind_core::crc::{downlink_format, icao_address, typecode};
use wind_core::types::{
    icao_to_string, Bds50Record, Bds60Record, CommBRegister, CprMessage, Icao, PositionRecord,
    Result,
};
use wind_core::wind::wind_vector;

use crate::capture::{bucket_ms, parse_capture, CaptureRecord};

/// Merge key: time bucket + aircraft.
type Key = (u64, Icao);

/// One output CSV row.
#[derive(Debug, Serialize)]
pub(crate) struct Row {
    /// Time bucket, unix milliseconds.
    time: u64,
    icao: String,
    lat: f64,
    lon: f64,
    /// Position-stream altitude, feet.
    alt: Option<f64>,
    alt_bds50: Option<f64>,
    alt_bds60: Option<f64>,
    track: f64,
    ground_speed: f64,
    true_airspeed: f64,
    roll: Option<f64>,
    heading: f64,
    indicated_airspeed: Option<f64>,
    mach: Option<f64>,
    /// Inertial vertical rate, ft/min.
    vertical_rate: Option<i32>,
    wind_u: f64,
    wind_v: f64,
    wind_speed: f64,
    wind_direction: f64,
}

/// Decode one capture file and write its merged CSV into `out_dir`.
///
/// Returns the number of merged rows written.
pub fn decode_file(input: &Path, out_dir: &Path, resolution_ms: u64) -> Result<usize> {
    let reader = BufReader::new(File::open(input)?);
    let records = parse_capture(reader)?;
    debug!(file = %input.display(), frames = records.len(), "capture parsed");

    let (positions, bds50s, bds60s) = build_streams(&records, resolution_ms);
    debug!(
        positions = positions.len(),
        bds50 = bds50s.len(),
        bds60 = bds60s.len(),
        "streams staged"
    );

    let rows = merge_rows(&positions, &bds50s, &bds60s);

    let out_path = output_path(input, out_dir);
    write_csv(&out_path, &rows)?;
    Ok(rows.len())
}

/// Split tagged frames into the three staging streams.
pub(crate) fn build_streams(
    records: &[CaptureRecord],
    resolution_ms: u64,
) -> (Vec<PositionRecord>, Vec<Bds50Record>, Vec<Bds60Record>) {
    let mut cpr_groups: BTreeMap<Key, Vec<CprMessage>> = BTreeMap::new();
    let mut bds50s = Vec::new();
    let mut bds60s = Vec::new();

    for rec in records {
        let Some(icao) = icao_address(&rec.frame) else {
            continue;
        };
        let bucket = bucket_ms(rec.time_ms, resolution_ms);

        match downlink_format(&rec.frame) {
            17 => {
                let in_position_band = typecode(&rec.frame).is_some_and(|tc| (9..=18).contains(&tc));
                if in_position_band {
                    cpr_groups.entry((bucket, icao)).or_default().push(CprMessage {
                        time: rec.time_ms as f64 / 1000.0,
                        frame: rec.frame,
                    });
                }
            }
            20 | 21 => {
                let alt = surveillance_altitude(&rec.frame);
                match classify(&rec.frame) {
                    CommBRegister::Bds50(fields) => bds50s.push(Bds50Record {
                        time_ms: bucket,
                        icao,
                        alt,
                        fields,
                    }),
                    CommBRegister::Bds60(fields) => bds60s.push(Bds60Record {
                        time_ms: bucket,
                        icao,
                        alt,
                        fields,
                    }),
                    CommBRegister::Unclassified => {}
                }
            }
            _ => {}
        }
    }

    let mut positions = Vec::new();
    for ((bucket, icao), msgs) in &cpr_groups {
        match resolve_batch(*icao, msgs) {
            Ok(fixes) => {
                positions.extend(fixes.into_iter().map(|fix| PositionRecord {
                    time_ms: *bucket,
                    icao: fix.icao,
                    lat: fix.lat,
                    lon: fix.lon,
                    alt: fix.alt,
                }));
            }
            Err(e) => {
                warn!(icao = %icao_to_string(*icao), bucket, error = %e, "position batch skipped");
            }
        }
    }

    (positions, bds50s, bds60s)
}

/// Inner-merge the three streams on (time bucket, ICAO).
///
/// BDS 5,0 rows need track, ground speed and true airspeed; BDS 6,0 rows
/// need a heading; rows without them cannot yield a wind and are dropped.
/// Multiple records under one key merge as a cross product, matching a
/// relational inner join.
pub(crate) fn merge_rows(
    positions: &[PositionRecord],
    bds50s: &[Bds50Record],
    bds60s: &[Bds60Record],
) -> Vec<Row> {
    let mut by_key_50: BTreeMap<Key, Vec<&Bds50Record>> = BTreeMap::new();
    for rec in bds50s {
        let complete =
            rec.fields.track.is_some() && rec.fields.ground_speed.is_some() && rec.fields.true_airspeed.is_some();
        if complete {
            by_key_50.entry((rec.time_ms, rec.icao)).or_default().push(rec);
        }
    }

    let mut by_key_60: BTreeMap<Key, Vec<&Bds60Record>> = BTreeMap::new();
    for rec in bds60s {
        if rec.fields.heading.is_some() {
            by_key_60.entry((rec.time_ms, rec.icao)).or_default().push(rec);
        }
    }

    let mut rows = Vec::new();
    for pos in positions {
        let key = (pos.time_ms, pos.icao);
        let (Some(r50s), Some(r60s)) = (by_key_50.get(&key), by_key_60.get(&key)) else {
            continue;
        };
        for r50 in r50s {
            for r60 in r60s {
                // presence checked when the key maps were built
                let (Some(track), Some(gs), Some(tas)) = (
                    r50.fields.track,
                    r50.fields.ground_speed,
                    r50.fields.true_airspeed,
                ) else {
                    continue;
                };
                let Some(heading) = r60.fields.heading else {
                    continue;
                };

                let wind = wind_vector(gs, track, tas, heading);
                rows.push(Row {
                    time: pos.time_ms,
                    icao: icao_to_string(pos.icao),
                    lat: pos.lat,
                    lon: pos.lon,
                    alt: pos.alt,
                    alt_bds50: r50.alt,
                    alt_bds60: r60.alt,
                    track,
                    ground_speed: gs,
                    true_airspeed: tas,
                    roll: r50.fields.roll,
                    heading,
                    indicated_airspeed: r60.fields.indicated_airspeed,
                    mach: r60.fields.mach,
                    vertical_rate: r60.fields.vertical_rate_inertial,
                    wind_u: wind.u,
                    wind_v: wind.v,
                    wind_speed: wind.speed,
                    wind_direction: wind.direction,
                });
            }
        }
    }
    rows
}

/// `<out_dir>/<input stem>.csv`
fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string());
    out_dir.join(format!("{stem}.csv"))
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(io::Error::other)?;
    for row in rows {
        writer.serialize(row).map_err(io::Error::other)?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
