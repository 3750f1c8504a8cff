//! Track database construction from per-section label files.
//!
//! Each section of the course has one tab-separated label file whose rows
//! carry `[timestamp, <ignored>, track_number, ...]`. Consecutive rows define
//! one track each: a row's timestamp starts the track it names, the next
//! row's timestamp ends it. The last row of a file only terminates the
//! previous track.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;

use crate::{Course, CourseCutError};

/// One track of the course, keyed by its globally unique number.
///
/// The start and end positions are opaque timestamp strings taken verbatim
/// from the label rows; they are handed to the encoder untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackRecord {
    pub number: u32,
    pub start: String,
    pub end: String,
    pub section: u32,
    pub source: Option<PathBuf>,
}

/// Mapping of track number to [`TrackRecord`], dense over the whole course.
///
/// Construction guarantees that every track number in `1..=course.tracks` is
/// present exactly once. Iteration is in ascending track order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackDatabase {
    records: BTreeMap<u32, TrackRecord>,
}

impl TrackDatabase {
    /// Number of tracks in the database.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a single track by number.
    pub fn get(&self, number: u32) -> Option<&TrackRecord> {
        self.records.get(&number)
    }

    /// Iterate over all records in ascending track order.
    pub fn tracks(&self) -> impl Iterator<Item = &TrackRecord> {
        self.records.values()
    }

    /// Attach `path` as the source recording for every track of `section`.
    ///
    /// A section that was already matched to a different path is re-matched
    /// silently apart from a warning; the last association wins.
    pub fn attach_source(&mut self, section: u32, path: &Path) {
        let previous = self
            .records
            .values()
            .find(|record| record.section == section)
            .and_then(|record| record.source.clone());
        if let Some(previous) = previous {
            if previous.as_path() != path {
                warn!(
                    "section {section} was already matched to '{}'; replacing with '{}'",
                    previous.display(),
                    path.display()
                );
            }
        }

        for record in self
            .records
            .values_mut()
            .filter(|record| record.section == section)
        {
            record.source = Some(path.to_path_buf());
        }
    }

    /// Sections whose tracks have no source recording attached, ascending.
    pub fn sections_without_source(&self) -> Vec<u32> {
        let mut sections: Vec<u32> = self
            .records
            .values()
            .filter(|record| record.source.is_none())
            .map(|record| record.section)
            .collect();
        sections.sort_unstable();
        sections.dedup();
        sections
    }
}

struct LabelRow {
    timestamp: String,
    track: u32,
}

fn parse_rows(section: u32, text: &str) -> Result<Vec<LabelRow>, CourseCutError> {
    let mut rows = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(CourseCutError::ShortLabelRow {
                section,
                line: index + 1,
                found: fields.len(),
            });
        }

        let track_field = fields[2].trim();
        let track = track_field
            .parse::<u32>()
            .map_err(|_| CourseCutError::BadTrackNumber {
                section,
                line: index + 1,
                value: track_field.to_owned(),
            })?;

        rows.push(LabelRow {
            timestamp: fields[0].to_owned(),
            track,
        });
    }
    Ok(rows)
}

fn collect_section(
    mut records: BTreeMap<u32, TrackRecord>,
    section: u32,
    rows: &[LabelRow],
    course: Course,
) -> Result<BTreeMap<u32, TrackRecord>, CourseCutError> {
    for pair in rows.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        if current.track == 0 || current.track > course.tracks {
            return Err(CourseCutError::TrackOutOfRange {
                track: current.track,
                total: course.tracks,
                section,
            });
        }

        let record = TrackRecord {
            number: current.track,
            start: current.timestamp.clone(),
            end: next.timestamp.clone(),
            section,
            source: None,
        };
        if let Some(existing) = records.insert(current.track, record) {
            return Err(CourseCutError::DuplicateTrack {
                track: current.track,
                first: existing.section,
                second: section,
            });
        }
    }
    Ok(records)
}

/// Build the track database from per-section label texts.
///
/// Sections are processed in ascending section-number order regardless of the
/// order they are supplied in. Any malformed row, duplicate track number, or
/// gap in `1..=course.tracks` aborts construction; no partial database is
/// ever returned.
pub fn build_database<S: AsRef<str>>(
    labels: &[(u32, S)],
    course: Course,
) -> Result<TrackDatabase, CourseCutError> {
    let mut sections: Vec<(u32, &str)> = labels
        .iter()
        .map(|(number, text)| (*number, text.as_ref()))
        .collect();
    sections.sort_by_key(|(number, _)| *number);

    let records = sections
        .iter()
        .try_fold(BTreeMap::new(), |records, (section, text)| {
            let rows = parse_rows(*section, text)?;
            collect_section(records, *section, &rows, course)
        })?;

    for track in 1..=course.tracks {
        if !records.contains_key(&track) {
            return Err(CourseCutError::MissingTrack(track));
        }
    }

    Ok(TrackDatabase { records })
}

/// Attach each supplied source recording to its section's tracks.
///
/// The section is the leading run of decimal digits in the file name; a name
/// without one is rejected. Paths are processed in supplied order, so a later
/// path matching an already-matched section replaces it.
pub fn associate_sources(
    db: &mut TrackDatabase,
    sources: &[PathBuf],
) -> Result<(), CourseCutError> {
    for path in sources {
        let section = section_of(path)?;
        db.attach_source(section, path);
    }
    Ok(())
}

fn section_of(path: &Path) -> Result<u32, CourseCutError> {
    let name = path.file_name().and_then(|name| name.to_str()).unwrap_or("");
    let digits_end = name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(name.len());
    name[..digits_end]
        .parse::<u32>()
        .map_err(|_| CourseCutError::InvalidSourceName(name.to_owned()))
}
