use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{IngestError, Result};
use crate::models::VisitRecord;

pub const USER_NAME: &str = "userName";
pub const COURSE_CODE: &str = "courseCode";
pub const COURSE_TITLE: &str = "CourseTitle";
pub const PROGRAM: &str = "Program";
pub const DEPARTMENT: &str = "Department";
pub const VISIT_DATE: &str = "visit_date";
pub const VISITS_ON_THAT_DAY: &str = "visits_on_that_day";

const CANONICAL: [&str; 7] = [
    USER_NAME,
    COURSE_CODE,
    COURSE_TITLE,
    PROGRAM,
    DEPARTMENT,
    VISIT_DATE,
    VISITS_ON_THAT_DAY,
];

// Header spellings seen in exported visit logs.
const BUILTIN_ALIASES: [(&str, &str); 8] = [
    ("visits_on_that_d", VISITS_ON_THAT_DAY),
    ("visitsOnThatDay", VISITS_ON_THAT_DAY),
    ("title", COURSE_TITLE),
    ("course_title", COURSE_TITLE),
    ("deptName", DEPARTMENT),
    ("visitDate", VISIT_DATE),
    ("user_name", USER_NAME),
    ("course_code", COURSE_CODE),
];

/// Largest per-row visit count accepted. Keeps report sums far from `u64`
/// overflow for any realistic number of rows.
pub const MAX_VISITS_PER_DAY: u64 = u32::MAX as u64;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Maps raw header text to canonical column names. Matching is
/// case-insensitive and ignores surrounding whitespace.
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    names: BTreeMap<String, &'static str>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let mut names = BTreeMap::new();
        for column in CANONICAL {
            names.insert(column.to_lowercase(), column);
        }
        for (alias, column) in BUILTIN_ALIASES {
            names.insert(alias.to_lowercase(), column);
        }
        Self { names }
    }
}

impl ColumnAliases {
    /// Built-in aliases extended with `extra` (alias -> canonical name).
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Result<Self> {
        let mut aliases = Self::default();

        for (alias, target) in extra {
            let column = CANONICAL
                .iter()
                .copied()
                .find(|column| column.eq_ignore_ascii_case(target.trim()))
                .ok_or_else(|| IngestError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                })?;
            let key = alias.trim().to_lowercase();
            if let Some(existing) = aliases.resolve(&key) {
                if existing != column {
                    return Err(IngestError::ConflictingAlias {
                        alias: alias.clone(),
                        existing,
                        target: column,
                    });
                }
            }
            aliases.names.insert(key, column);
        }

        Ok(aliases)
    }

    pub fn resolve(&self, header: &str) -> Option<&'static str> {
        self.names.get(&header.trim().to_lowercase()).copied()
    }
}

#[derive(Debug)]
struct ColumnIndex {
    user_name: usize,
    course_code: usize,
    course_title: Option<usize>,
    program: usize,
    department: usize,
    visit_date: usize,
    visits_on_that_day: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord, aliases: &ColumnAliases) -> Result<Self> {
        let mut positions: BTreeMap<&'static str, usize> = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(column) = aliases.resolve(header) {
                positions.entry(column).or_insert(idx);
            } else {
                tracing::debug!(header, "ignoring unrecognized column");
            }
        }

        let required = |column: &'static str| {
            positions
                .get(column)
                .copied()
                .ok_or(IngestError::MissingColumn { column })
        };

        Ok(Self {
            user_name: required(USER_NAME)?,
            course_code: required(COURSE_CODE)?,
            course_title: positions.get(COURSE_TITLE).copied(),
            program: required(PROGRAM)?,
            department: required(DEPARTMENT)?,
            visit_date: required(VISIT_DATE)?,
            visits_on_that_day: required(VISITS_ON_THAT_DAY)?,
        })
    }
}

pub fn read_visits(path: &Path, aliases: &ColumnAliases) -> Result<Vec<VisitRecord>> {
    let file = File::open(path)?;
    let records = parse_visits(file, aliases)?;
    tracing::info!(path = %path.display(), rows = records.len(), "loaded visit log");
    Ok(records)
}

/// Reads a CSV visit log, normalizing header variants and validating every
/// cell. The first bad row aborts the whole load.
pub fn parse_visits<R: Read>(reader: R, aliases: &ColumnAliases) -> Result<Vec<VisitRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers, aliases)?;
    let mut records = Vec::new();

    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|pos| pos.line()).unwrap_or_default();
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let text = |idx: usize, column: &'static str| -> Result<String> {
            let value = cell(idx);
            if value.is_empty() {
                return Err(IngestError::InvalidValue {
                    line,
                    column,
                    value: value.to_string(),
                });
            }
            Ok(value.to_string())
        };

        let date_cell = cell(columns.visit_date);
        let visit_date = parse_date(date_cell).ok_or_else(|| IngestError::InvalidValue {
            line,
            column: VISIT_DATE,
            value: date_cell.to_string(),
        })?;

        let visits_cell = cell(columns.visits_on_that_day);
        let visits_on_that_day =
            parse_count(visits_cell).ok_or_else(|| IngestError::InvalidValue {
                line,
                column: VISITS_ON_THAT_DAY,
                value: visits_cell.to_string(),
            })?;

        let course_title = columns
            .course_title
            .map(cell)
            .filter(|title| !title.is_empty())
            .map(str::to_string);

        records.push(VisitRecord {
            user_name: text(columns.user_name, USER_NAME)?,
            course_code: text(columns.course_code, COURSE_CODE)?,
            course_title,
            program: text(columns.program, PROGRAM)?,
            department: text(columns.department, DEPARTMENT)?,
            visit_date,
            visits_on_that_day,
        });
    }

    Ok(records)
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// Non-negative whole counts up to [`MAX_VISITS_PER_DAY`]. Spreadsheet
/// exports sometimes write `3.0`.
pub fn parse_count(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(count) = value.parse::<u64>() {
        return (count <= MAX_VISITS_PER_DAY).then_some(count);
    }

    let float = value.parse::<f64>().ok()?;
    if float.is_finite()
        && float >= 0.0
        && float.fract() == 0.0
        && float <= MAX_VISITS_PER_DAY as f64
    {
        Some(float as u64)
    } else {
        None
    }
}
