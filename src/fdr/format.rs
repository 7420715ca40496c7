// SPDX-License-Identifier: MIT
use std::fmt::Write as _;
use std::io::{self, Write};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::sampler::{Sample, Signal};

pub const FORMAT_TAG: &str = "A";
pub const FORMAT_VERSION: u32 = 3;
pub const PRECISION: usize = 5;
pub const DREF_SCALE: &str = "1.0";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub direction: f64,
    pub speed: f64,
}

impl Default for Wind {
    fn default() -> Self {
        Self {
            direction: 180.0,
            speed: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FdrHeader {
    pub aircraft: String,
    pub tail: String,
    pub started: NaiveDateTime,
    pub pressure_inhg: f64,
    pub delta_isa: f64,
    pub wind: Wind,
}

/// One logged column, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FdrColumn {
    pub label: String,
    pub signal: String,
    /// Dataref declared with a `DREF` line; `None` for positional columns.
    pub dref: Option<String>,
}

impl FdrColumn {
    #[must_use]
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            label: signal.column().to_string(),
            signal: signal.name.clone(),
            dref: (!signal.positional).then(|| signal.address.clone()),
        }
    }
}

/// `FDR_DD-MM-YYYY_HH-MM-SS.fdr`
#[must_use]
pub fn file_name(started: NaiveDateTime) -> String {
    format!("FDR_{}.fdr", started.format("%d-%m-%Y_%H-%M-%S"))
}

/// Writes everything up to and including the `COMM` column line.
///
/// # Errors
///
/// Propagates any I/O error from `out`.
pub fn write_header(out: &mut impl Write, header: &FdrHeader, columns: &[FdrColumn]) -> io::Result<()> {
    writeln!(out, "{FORMAT_TAG}")?;
    writeln!(out, "{FORMAT_VERSION}")?;
    writeln!(out)?;
    writeln!(out, "ACFT, {}", header.aircraft)?;
    writeln!(out, "TAIL, {}", header.tail)?;
    writeln!(out, "TIME, {}", header.started.format("%H:%M:%S"))?;
    writeln!(out, "DATE, {}", header.started.format("%d/%m/%Y"))?;
    writeln!(out, "PRES, {}", header.pressure_inhg)?;
    writeln!(out, "DISA, {}", header.delta_isa)?;
    writeln!(out, "WIND, {},{}", header.wind.direction, header.wind.speed)?;
    writeln!(out)?;

    let mut declared = false;
    for dref in columns.iter().filter_map(|c| c.dref.as_deref()) {
        writeln!(out, "DREF, {dref}\t\t\t{DREF_SCALE}")?;
        declared = true;
    }
    if declared {
        writeln!(out)?;
    }

    write!(out, "COMM,Sample")?;
    for column in columns {
        write!(out, ",{}", column.label)?;
    }
    writeln!(out)
}

/// Formats one `DATA` line (with trailing newline). Columns missing from the
/// sample are written as `NaN`.
#[must_use]
pub fn data_line(index: u64, sample: &Sample, columns: &[FdrColumn]) -> String {
    let mut line = format!("DATA,{index}");
    for column in columns {
        let value = sample.value(&column.signal).unwrap_or(f64::NAN);
        let _ = write!(line, ",{value:.prec$}", prec = PRECISION);
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn make_header() -> FdrHeader {
        FdrHeader {
            aircraft: "Aircraft/Laminar Research/Airbus A330-300/A330.acf".to_string(),
            tail: "N12345".to_string(),
            started: NaiveDate::from_ymd_opt(2025, 3, 7)
                .unwrap()
                .and_hms_opt(9, 5, 3)
                .unwrap(),
            pressure_inhg: 29.92,
            delta_isa: 0.0,
            wind: Wind::default(),
        }
    }

    #[test]
    fn header_layout() {
        let columns = vec![
            FdrColumn::from_signal(&Signal::new("lon", "sim/lon").with_column("Long").positional()),
            FdrColumn::from_signal(&Signal::new("cas", "sim/cas").with_column("CAS")),
        ];
        let mut out = Vec::new();
        write_header(&mut out, &make_header(), &columns).unwrap();

        let expected = "A\n3\n\n\
            ACFT, Aircraft/Laminar Research/Airbus A330-300/A330.acf\n\
            TAIL, N12345\n\
            TIME, 09:05:03\n\
            DATE, 07/03/2025\n\
            PRES, 29.92\n\
            DISA, 0\n\
            WIND, 180,10\n\n\
            DREF, sim/cas\t\t\t1.0\n\n\
            COMM,Sample,Long,CAS\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn header_without_drefs_has_single_separator() {
        let columns = vec![FdrColumn::from_signal(
            &Signal::new("lat", "sim/lat").with_column("Lat").positional(),
        )];
        let mut out = Vec::new();
        write_header(&mut out, &make_header(), &columns).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("WIND, 180,10\n\nCOMM,Sample,Lat\n"));
        assert!(!text.contains("DREF"));
    }

    #[test]
    fn data_line_fixed_precision_and_nan() {
        let columns = vec![
            FdrColumn::from_signal(&Signal::new("alt", "sim/alt")),
            FdrColumn::from_signal(&Signal::new("cas", "sim/cas")),
            FdrColumn::from_signal(&Signal::new("vspd", "sim/vspd")),
        ];
        let sample = Sample::new(0.0)
            .with("alt", 1010.0)
            .with("cas", f64::NAN)
            .with("vspd", -512.123_456);
        assert_eq!(
            data_line(7, &sample, &columns),
            "DATA,7,1010.00000,NaN,-512.12346\n"
        );
    }

    #[test]
    fn missing_column_is_nan() {
        let columns = vec![FdrColumn::from_signal(&Signal::new("alt", "sim/alt"))];
        assert_eq!(data_line(0, &Sample::new(0.0), &columns), "DATA,0,NaN\n");
    }

    #[test]
    fn file_name_is_filesystem_safe() {
        assert_eq!(file_name(make_header().started), "FDR_07-03-2025_09-05-03.fdr");
    }
}
