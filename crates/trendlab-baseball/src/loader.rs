// Monthly split loading and validation.
//
// Reads one CSV per month from a data directory. Files are named MM_YYYY.csv
// (e.g. 04_2021.csv); season and month come from the file name, not from any
// in-file columns. Required columns must be present and hold non-negative
// whole numbers; the loader refuses the dataset rather than zero-filling.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trendlab_core::config::{Config, DataConfig};

use crate::observation::{BattingComponents, Observation};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("no CSV files found in {dir}")]
    NoFiles { dir: String },

    #[error("no usable CSVs found in {dir}; file names must match MM_YYYY.csv")]
    NoUsableFiles { dir: String },

    #[error("{path}: missing required column `{column}`")]
    MissingColumn { path: String, column: &'static str },

    #[error("{path}, data row {row}: column `{column}` has invalid value {value:?} ({reason})")]
    InvalidValue {
        path: String,
        row: usize,
        column: &'static str,
        value: String,
        reason: &'static str,
    },
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Parse `MM_YYYY.csv` into `(month, season)`.
pub fn parse_split_file_name(name: &str) -> Option<(u8, i32)> {
    let stem = name.strip_suffix(".csv")?;
    let (month, year) = stem.split_once('_')?;
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if month.len() != 2 || year.len() != 4 || !all_digits(month) || !all_digits(year) {
        return None;
    }
    let month: u8 = month.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((month, year.parse().ok()?))
}

// ---------------------------------------------------------------------------
// Column lookup
// ---------------------------------------------------------------------------

/// Header positions, keyed by column name. Accepts the export's aliases
/// (`Tm` for Team, `SO` for K) and strips a UTF-8 BOM from the first header.
struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            let name = h.trim_start_matches('\u{feff}').trim();
            index.entry(name.to_string()).or_insert(i);
        }
        Columns { index }
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.index.get(*n).copied())
    }
}

/// A numeric column the FWOBA engine needs.
struct Required {
    column: &'static str,
    idx: usize,
}

/// A column that may be absent from a given export.
struct Optional {
    column: &'static str,
    idx: Option<usize>,
}

struct Layout {
    name: usize,
    team: Option<usize>,
    pa: Required,
    h: Required,
    r: Required,
    doubles: Required,
    hr: Required,
    sb: Required,
    bb: Required,
    rbi: Required,
    k: Required,
    ab: Optional,
    singles: Optional,
    triples: Optional,
    ibb: Optional,
    hbp: Optional,
    sf: Optional,
    woba: Optional,
    ops: Optional,
    avg: Optional,
    xwoba: Optional,
    fwar: Optional,
}

impl Layout {
    fn resolve(columns: &Columns, path: &str) -> Result<Self, LoadError> {
        let required = |column: &'static str, aliases: &[&str]| -> Result<Required, LoadError> {
            let idx = columns.find(aliases).ok_or_else(|| LoadError::MissingColumn {
                path: path.to_string(),
                column,
            })?;
            Ok(Required { column, idx })
        };
        let optional = |column: &'static str| Optional {
            column,
            idx: columns.find(&[column]),
        };

        Ok(Layout {
            name: required("Name", &["Name"])?.idx,
            team: columns.find(&["Team", "Tm"]),
            pa: required("PA", &["PA"])?,
            h: required("H", &["H"])?,
            r: required("R", &["R"])?,
            doubles: required("2B", &["2B"])?,
            hr: required("HR", &["HR"])?,
            sb: required("SB", &["SB"])?,
            bb: required("BB", &["BB"])?,
            rbi: required("RBI", &["RBI"])?,
            k: required("K", &["K", "SO"])?,
            ab: optional("AB"),
            singles: optional("1B"),
            triples: optional("3B"),
            ibb: optional("IBB"),
            hbp: optional("HBP"),
            sf: optional("SF"),
            woba: optional("wOBA"),
            ops: optional("OPS"),
            avg: optional("AVG"),
            xwoba: optional("xwOBA"),
            fwar: Optional {
                column: "WAR",
                idx: columns.find(&["WAR", "fWAR"]),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Non-negative whole number. Exports sometimes write counts as `12.0`.
fn parse_count(raw: &str) -> Result<u32, &'static str> {
    if raw.is_empty() {
        return Err("blank");
    }
    let value: f64 = raw.parse().map_err(|_| "not a number")?;
    if !value.is_finite() {
        return Err("not finite");
    }
    if value < 0.0 {
        return Err("negative");
    }
    if value.fract() != 0.0 {
        return Err("not a whole number");
    }
    if value > u32::MAX as f64 {
        return Err("out of range");
    }
    Ok(value as u32)
}

fn parse_rate(raw: &str) -> Result<f64, &'static str> {
    let value: f64 = raw.parse().map_err(|_| "not a number")?;
    if !value.is_finite() {
        return Err("not finite");
    }
    Ok(value)
}

/// Cursor over one data row that turns cell failures into `LoadError`s.
struct RowReader<'a> {
    record: &'a csv::StringRecord,
    path: &'a str,
    row: usize,
}

impl RowReader<'_> {
    fn cell(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("").trim()
    }

    fn invalid(&self, column: &'static str, value: &str, reason: &'static str) -> LoadError {
        LoadError::InvalidValue {
            path: self.path.to_string(),
            row: self.row,
            column,
            value: value.to_string(),
            reason,
        }
    }

    fn count(&self, col: &Required) -> Result<u32, LoadError> {
        let raw = self.cell(col.idx);
        parse_count(raw).map_err(|reason| self.invalid(col.column, raw, reason))
    }

    fn optional_count(&self, col: &Optional) -> Result<Option<u32>, LoadError> {
        let Some(idx) = col.idx else { return Ok(None) };
        let raw = self.cell(idx);
        if raw.is_empty() {
            return Ok(None);
        }
        parse_count(raw)
            .map(Some)
            .map_err(|reason| self.invalid(col.column, raw, reason))
    }

    fn optional_rate(&self, col: &Optional) -> Result<Option<f64>, LoadError> {
        let Some(idx) = col.idx else { return Ok(None) };
        let raw = self.cell(idx);
        if raw.is_empty() {
            return Ok(None);
        }
        parse_rate(raw)
            .map(Some)
            .map_err(|reason| self.invalid(col.column, raw, reason))
    }
}

// ---------------------------------------------------------------------------
// Reader-based loader (enables testing without temp files)
// ---------------------------------------------------------------------------

/// Parse one monthly split. `path` is only used in error messages.
pub fn load_split_from_reader<R: Read>(
    rdr: R,
    path: &str,
    season: i32,
    month: u8,
) -> Result<Vec<Observation>, LoadError> {
    let csv_err = |e: csv::Error| LoadError::Csv {
        path: path.to_string(),
        source: e,
    };

    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers().map_err(csv_err)?.clone();
    let layout = Layout::resolve(&Columns::new(&headers), path)?;

    let mut observations = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let row = RowReader {
            record: &record,
            path,
            row: i + 1,
        };

        let name = row.cell(layout.name);
        if name.is_empty() {
            return Err(row.invalid("Name", name, "blank"));
        }

        observations.push(Observation {
            name: name.to_string(),
            team: layout.team.map(|idx| row.cell(idx).to_string()).unwrap_or_default(),
            season,
            month,
            pa: row.count(&layout.pa)?,
            h: row.count(&layout.h)?,
            r: row.count(&layout.r)?,
            doubles: row.count(&layout.doubles)?,
            hr: row.count(&layout.hr)?,
            sb: row.count(&layout.sb)?,
            bb: row.count(&layout.bb)?,
            rbi: row.count(&layout.rbi)?,
            k: row.count(&layout.k)?,
            components: BattingComponents {
                ab: row.optional_count(&layout.ab)?,
                singles: row.optional_count(&layout.singles)?,
                triples: row.optional_count(&layout.triples)?,
                ibb: row.optional_count(&layout.ibb)?,
                hbp: row.optional_count(&layout.hbp)?,
                sf: row.optional_count(&layout.sf)?,
            },
            woba: row.optional_rate(&layout.woba)?,
            ops: row.optional_rate(&layout.ops)?,
            avg: row.optional_rate(&layout.avg)?,
            xwoba: row.optional_rate(&layout.xwoba)?,
            fwar: row.optional_rate(&layout.fwar)?,
        });
    }
    Ok(observations)
}

// ---------------------------------------------------------------------------
// Directory loader
// ---------------------------------------------------------------------------

/// Load every monthly split in `dir`, sorted by (season, month, name).
pub fn load_monthly_dir(dir: &Path, data: &DataConfig) -> Result<Vec<Observation>, LoadError> {
    let dir_display = dir.display().to_string();
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::Io {
        path: dir_display.clone(),
        source: e,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LoadError::Io {
            path: dir_display.clone(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(LoadError::NoFiles { dir: dir_display });
    }

    let mut observations = Vec::new();
    let mut usable = 0usize;
    for path in &files {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let Some((month, season)) = parse_split_file_name(file_name) else {
            warn!("skipping unrecognized filename: {}", file_name);
            continue;
        };
        usable += 1;

        if season < data.min_season {
            debug!("skipping {} (season {} < {})", file_name, season, data.min_season);
            continue;
        }

        let path_display = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
            path: path_display.clone(),
            source: e,
        })?;
        let rows = load_split_from_reader(file, &path_display, season, month)?;
        debug!("loaded {} rows from {}", rows.len(), file_name);
        observations.extend(rows);
    }

    if usable == 0 {
        return Err(LoadError::NoUsableFiles { dir: dir_display });
    }

    observations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    info!(
        "Loaded {} player-months from {} files in {}",
        observations.len(),
        usable,
        dir_display
    );
    Ok(observations)
}

/// Load the dataset configured under `[data]`.
pub fn load_all(config: &Config) -> Result<Vec<Observation>, LoadError> {
    load_monthly_dir(Path::new(&config.data.dir), &config.data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Name,Team,PA,AB,H,1B,2B,3B,HR,R,RBI,BB,IBB,SO,HBP,SF,SB,AVG,OPS,wOBA";

    fn load(csv_data: &str) -> Result<Vec<Observation>, LoadError> {
        load_split_from_reader(csv_data.as_bytes(), "05_2024.csv", 2024, 5)
    }

    // -- File names --

    #[test]
    fn file_name_parsing() {
        assert_eq!(parse_split_file_name("04_2021.csv"), Some((4, 2021)));
        assert_eq!(parse_split_file_name("09_2024.csv"), Some((9, 2024)));
        assert_eq!(parse_split_file_name("4_2021.csv"), None);
        assert_eq!(parse_split_file_name("04-2021.csv"), None);
        assert_eq!(parse_split_file_name("04_21.csv"), None);
        assert_eq!(parse_split_file_name("13_2021.csv"), None);
        assert_eq!(parse_split_file_name("00_2021.csv"), None);
        assert_eq!(parse_split_file_name("04_2021.txt"), None);
        assert_eq!(parse_split_file_name("season_totals.csv"), None);
    }

    // -- Full export row --

    #[test]
    fn full_export_row() {
        let csv_data = format!(
            "{HEADER}\n\
             Juan Soto,NYY,118,95,30,19,6,0,5,22,18,21,3,17,1,1,2,.316,1.048,.440"
        );
        let rows = load(&csv_data).unwrap();
        assert_eq!(rows.len(), 1);
        let o = &rows[0];
        assert_eq!(o.name, "Juan Soto");
        assert_eq!(o.team, "NYY");
        assert_eq!((o.season, o.month), (2024, 5));
        assert_eq!(o.pa, 118);
        assert_eq!(o.h, 30);
        assert_eq!(o.doubles, 6);
        assert_eq!(o.hr, 5);
        assert_eq!(o.r, 22);
        assert_eq!(o.rbi, 18);
        assert_eq!(o.bb, 21);
        assert_eq!(o.k, 17);
        assert_eq!(o.sb, 2);
        assert_eq!(o.components.ab, Some(95));
        assert_eq!(o.components.singles, Some(19));
        assert_eq!(o.components.ibb, Some(3));
        assert_eq!(o.woba, Some(0.440));
        assert_eq!(o.ops, Some(1.048));
        assert_eq!(o.avg, Some(0.316));
        assert_eq!(o.xwoba, None);
    }

    // -- Aliases --

    #[test]
    fn tm_and_k_aliases() {
        let csv_data = "\
Name,Tm,PA,H,R,2B,HR,SB,BB,RBI,K
Bobby Witt Jr.,KCR,120,38,24,9,6,7,8,20,15";
        let rows = load(csv_data).unwrap();
        assert_eq!(rows[0].team, "KCR");
        assert_eq!(rows[0].k, 15);
    }

    #[test]
    fn bom_on_first_header_is_ignored() {
        let csv_data = "\u{feff}Name,PA,H,R,2B,HR,SB,BB,RBI,SO\nA,10,3,1,0,0,0,1,2,2";
        let rows = load(csv_data).unwrap();
        assert_eq!(rows[0].name, "A");
        assert_eq!(rows[0].team, "");
    }

    #[test]
    fn whole_number_floats_accepted() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO
A,100.0,25.0,10,2,3,1,8,12,20";
        let rows = load(csv_data).unwrap();
        assert_eq!(rows[0].pa, 100);
        assert_eq!(rows[0].h, 25);
    }

    #[test]
    fn blank_optional_cells_stay_unknown() {
        let csv_data = "\
Name,PA,AB,H,R,2B,HR,SB,BB,RBI,SO,wOBA
A,100,,25,10,2,3,1,8,12,20,";
        let rows = load(csv_data).unwrap();
        assert_eq!(rows[0].components.ab, None);
        assert_eq!(rows[0].woba, None);
    }

    #[test]
    fn war_column_carried_through() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO,WAR
A,100,25,10,2,3,1,8,12,20,0.9
B,12,2,1,0,0,0,1,0,4,";
        let rows = load(csv_data).unwrap();
        assert_eq!(rows[0].fwar, Some(0.9));
        assert_eq!(rows[1].fwar, None);

        let renamed = load("Name,PA,H,R,2B,HR,SB,BB,RBI,SO,fWAR\nA,100,25,10,2,3,1,8,12,20,-0.4").unwrap();
        assert_eq!(renamed[0].fwar, Some(-0.4));
    }

    #[test]
    fn war_must_be_numeric() {
        let err = load("Name,PA,H,R,2B,HR,SB,BB,RBI,SO,WAR\nA,100,25,10,2,3,1,8,12,20,n/a").unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { column: "WAR", .. }));
    }

    #[test]
    fn zero_pa_row_is_kept() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO
Pinch Runner,0,0,2,0,0,1,0,0,0";
        let rows = load(csv_data).unwrap();
        assert_eq!(rows[0].pa, 0);
        assert_eq!(rows[0].sb, 1);
    }

    // -- Precondition failures --

    #[test]
    fn missing_required_column() {
        let csv_data = "\
Name,PA,H,R,2B,HR,BB,RBI,SO
A,100,25,10,2,3,8,12,20";
        match load(csv_data).unwrap_err() {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "SB"),
            other => panic!("expected MissingColumn, got: {other}"),
        }
    }

    #[test]
    fn missing_strikeouts_under_either_name() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI
A,100,25,10,2,3,1,8,12";
        match load(csv_data).unwrap_err() {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "K"),
            other => panic!("expected MissingColumn, got: {other}"),
        }
    }

    #[test]
    fn non_numeric_required_value() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO
Valid,100,25,10,2,3,1,8,12,20
Broken,100,n/a,10,2,3,1,8,12,20";
        match load(csv_data).unwrap_err() {
            LoadError::InvalidValue {
                row, column, value, ..
            } => {
                assert_eq!(row, 2);
                assert_eq!(column, "H");
                assert_eq!(value, "n/a");
            }
            other => panic!("expected InvalidValue, got: {other}"),
        }
    }

    #[test]
    fn blank_required_value() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO
A,,25,10,2,3,1,8,12,20";
        match load(csv_data).unwrap_err() {
            LoadError::InvalidValue { column, reason, .. } => {
                assert_eq!(column, "PA");
                assert_eq!(reason, "blank");
            }
            other => panic!("expected InvalidValue, got: {other}"),
        }
    }

    #[test]
    fn negative_and_fractional_pa_rejected() {
        for (pa, expected) in [("-4", "negative"), ("99.5", "not a whole number"), ("inf", "not finite")] {
            let csv_data = format!("Name,PA,H,R,2B,HR,SB,BB,RBI,SO\nA,{pa},25,10,2,3,1,8,12,20");
            match load(&csv_data).unwrap_err() {
                LoadError::InvalidValue { column, reason, .. } => {
                    assert_eq!(column, "PA");
                    assert_eq!(reason, expected);
                }
                other => panic!("expected InvalidValue, got: {other}"),
            }
        }
    }

    #[test]
    fn non_numeric_optional_rate_rejected() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO,OPS
A,100,25,10,2,3,1,8,12,20,high";
        match load(csv_data).unwrap_err() {
            LoadError::InvalidValue { column, .. } => assert_eq!(column, "OPS"),
            other => panic!("expected InvalidValue, got: {other}"),
        }
    }

    #[test]
    fn blank_name_rejected() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO
  ,100,25,10,2,3,1,8,12,20";
        match load(csv_data).unwrap_err() {
            LoadError::InvalidValue { column, .. } => assert_eq!(column, "Name"),
            other => panic!("expected InvalidValue, got: {other}"),
        }
    }

    #[test]
    fn ragged_row_is_csv_error() {
        let csv_data = "\
Name,PA,H,R,2B,HR,SB,BB,RBI,SO
A,100,25";
        assert!(matches!(load(csv_data).unwrap_err(), LoadError::Csv { .. }));
    }

    #[test]
    fn header_only_is_empty() {
        let rows = load("Name,PA,H,R,2B,HR,SB,BB,RBI,SO").unwrap();
        assert!(rows.is_empty());
    }
}
