use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{info, warn};
use thiserror::Error;

pub mod format;
pub mod labels;
pub mod plan;

pub use format::OutputFormat;
pub use labels::{associate_sources, build_database, TrackDatabase, TrackRecord};
pub use plan::{derive_segments, SegmentSpec};

/// Encoder binary invoked when none is configured explicitly.
pub const DEFAULT_ENCODER: &str = "ffmpeg";

/// Errors that can occur while building the track database or encoding
/// segments.
#[derive(Debug, Error)]
pub enum CourseCutError {
    /// A label row with fewer than the three required tab-separated fields.
    #[error("section {section}, line {line}: expected at least 3 tab-separated fields, found {found}")]
    ShortLabelRow {
        section: u32,
        line: usize,
        found: usize,
    },

    /// A label row whose track field is not a non-negative integer.
    #[error("section {section}, line {line}: track field '{value}' is not a number")]
    BadTrackNumber {
        section: u32,
        line: usize,
        value: String,
    },

    /// The same track number was defined by two label rows.
    #[error("track {track} is defined more than once (section {first} and section {second})")]
    DuplicateTrack { track: u32, first: u32, second: u32 },

    /// A defining label row named a track outside the course range.
    #[error("section {section}: track {track} is outside the course range 1..={total}")]
    TrackOutOfRange { track: u32, total: u32, section: u32 },

    /// No label row defines the named track, so the database has a gap.
    #[error("no label row defines track {0}")]
    MissingTrack(u32),

    /// The course shape declares zero sections or zero tracks.
    #[error("course must have at least one section and one track")]
    EmptyCourse,

    /// A source file name without the mandatory leading section digits.
    #[error("source file name '{0}' does not begin with a section number")]
    InvalidSourceName(String),

    /// Error returned when the label directory cannot be resolved.
    #[error("label directory does not exist: {}", .0.display())]
    MissingLabelDirectory(PathBuf),

    /// Error returned when the output directory cannot be resolved.
    #[error("output directory does not exist: {}", .0.display())]
    MissingOutputDirectory(PathBuf),

    /// A per-section label file could not be read.
    #[error("failed to read label file '{}'", path.display())]
    LabelRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file already exists and overwriting was not requested.
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// The encoder binary could not be launched at all.
    #[error("failed to launch encoder '{}'", command.display())]
    EncoderSpawn {
        command: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder ran but exited with a non-zero status.
    #[error("encoder exited with {status} while writing '{output_name}': {stderr}")]
    EncoderFailed {
        status: ExitStatus,
        output_name: String,
        stderr: String,
    },

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shape of the course material: how many section label files exist and how
/// many tracks they must define altogether.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Course {
    pub sections: u32,
    pub tracks: u32,
}

/// Configuration for one splitting run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Shape of the course the label files describe.
    pub course: Course,
    /// Canonicalized directory holding `section<n>.txt` label files.
    pub label_dir: PathBuf,
    /// Canonicalized directory into which the output files will be written.
    pub output_dir: PathBuf,
    /// Target format for every extracted track.
    pub format: OutputFormat,
    /// Source recordings, matched to sections by their file names.
    pub sources: Vec<PathBuf>,
    /// Replace existing output files instead of failing.
    pub overwrite: bool,
    /// Encoder binary to invoke.
    pub encoder: PathBuf,
}

impl Config {
    /// Start building a [`Config`], supplying the required pieces.
    pub fn builder<P, Q>(
        course: Course,
        label_dir: P,
        output_dir: Q,
        format: OutputFormat,
    ) -> ConfigBuilder
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        ConfigBuilder {
            course,
            label_dir: label_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            format,
            sources: Vec::new(),
            overwrite: false,
            encoder: PathBuf::from(DEFAULT_ENCODER),
        }
    }
}

/// Builder returned by [`Config::builder`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    course: Course,
    label_dir: PathBuf,
    output_dir: PathBuf,
    format: OutputFormat,
    sources: Vec<PathBuf>,
    overwrite: bool,
    encoder: PathBuf,
}

impl ConfigBuilder {
    /// Source recordings to match against sections.
    pub fn sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Allow replacing existing output files.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Use a different encoder binary than [`DEFAULT_ENCODER`].
    pub fn encoder<P: Into<PathBuf>>(mut self, encoder: P) -> Self {
        self.encoder = encoder.into();
        self
    }

    /// Validate the course shape and canonicalize the directories.
    pub fn build(self) -> Result<Config, CourseCutError> {
        if self.course.sections == 0 || self.course.tracks == 0 {
            return Err(CourseCutError::EmptyCourse);
        }

        let label_dir = fs::canonicalize(&self.label_dir)
            .map_err(|_| CourseCutError::MissingLabelDirectory(self.label_dir.clone()))?;
        let output_dir = fs::canonicalize(&self.output_dir)
            .map_err(|_| CourseCutError::MissingOutputDirectory(self.output_dir.clone()))?;

        Ok(Config {
            course: self.course,
            label_dir,
            output_dir,
            format: self.format,
            sources: self.sources,
            overwrite: self.overwrite,
            encoder: self.encoder,
        })
    }
}

/// Progress notifications emitted while encoding segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Encoding is about to start; `total_segments` outputs will be written.
    Start { total_segments: usize },
    /// One more segment was written.
    Advance {
        completed: usize,
        output_name: String,
    },
    /// All segments were written.
    Finish,
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Number of output files written.
    pub segments_encoded: usize,
    /// Sections whose tracks were skipped because no source matched them.
    pub sections_without_source: Vec<u32>,
}

fn label_file_name(section: u32) -> String {
    format!("section{section}.txt")
}

fn read_label_files(config: &Config) -> Result<Vec<(u32, String)>, CourseCutError> {
    let mut labels = Vec::with_capacity(config.course.sections as usize);
    for section in 1..=config.course.sections {
        let path = config.label_dir.join(label_file_name(section));
        let text = fs::read_to_string(&path).map_err(|source| CourseCutError::LabelRead {
            path: path.clone(),
            source,
        })?;
        labels.push((section, text));
    }
    Ok(labels)
}

/// Build the track database from the configured label directory and attach
/// the configured source recordings.
pub fn load_database(config: &Config) -> Result<TrackDatabase, CourseCutError> {
    let label_texts = read_label_files(config)?;
    let mut db = labels::build_database(&label_texts, config.course)?;
    labels::associate_sources(&mut db, &config.sources)?;
    Ok(db)
}

/// Derive the extraction plan without touching the encoder or the output
/// directory.
pub fn plan_segments(config: &Config) -> Result<Vec<SegmentSpec>, CourseCutError> {
    let db = load_database(config)?;
    Ok(plan::derive_segments(&db, config.format))
}

fn encode_segment(
    config: &Config,
    spec: &SegmentSpec,
    output_path: &Path,
) -> Result<(), CourseCutError> {
    let args = spec.encoder_args(config.format, output_path);
    info!(
        "encoding '{}' from '{}' ({} to {})",
        spec.output_name,
        spec.source.display(),
        spec.start,
        spec.end
    );

    let output = Command::new(&config.encoder)
        .args(&args)
        .output()
        .map_err(|source| CourseCutError::EncoderSpawn {
            command: config.encoder.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(CourseCutError::EncoderFailed {
            status: output.status,
            output_name: spec.output_name.clone(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    Ok(())
}

/// Perform the splitting run using the supplied [`Config`].
pub fn run(config: Config) -> Result<RunReport, CourseCutError> {
    run_with_progress(config, |_| {})
}

/// Perform the splitting run, reporting [`ProgressEvent`]s to the callback.
///
/// Outputs are written in ascending track order. The first failing encoder
/// invocation aborts the run; outputs written before the failure are left in
/// place.
pub fn run_with_progress<F>(config: Config, mut on_event: F) -> Result<RunReport, CourseCutError>
where
    F: FnMut(ProgressEvent),
{
    let db = load_database(&config)?;
    let specs = plan::derive_segments(&db, config.format);

    // The directory was canonicalized at configuration time but may have been
    // removed since.
    if !config.output_dir.is_dir() {
        return Err(CourseCutError::MissingOutputDirectory(
            config.output_dir.clone(),
        ));
    }

    for section in db.sections_without_source() {
        warn!("no source recording matched section {section}; skipping its tracks");
    }

    on_event(ProgressEvent::Start {
        total_segments: specs.len(),
    });

    let mut completed = 0;
    for spec in &specs {
        let output_path = config.output_dir.join(&spec.output_name);
        if output_path.exists() && !config.overwrite {
            return Err(CourseCutError::OutputExists(output_path));
        }

        encode_segment(&config, spec, &output_path)?;
        completed += 1;
        on_event(ProgressEvent::Advance {
            completed,
            output_name: spec.output_name.clone(),
        });
    }

    on_event(ProgressEvent::Finish);

    Ok(RunReport {
        segments_encoded: completed,
        sections_without_source: db.sections_without_source(),
    })
}
