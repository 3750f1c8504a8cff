use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::format::OutputFormat;
use crate::labels::TrackDatabase;

/// One planned extraction: everything the encoder needs to cut a single
/// track out of its section's source recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentSpec {
    pub track: u32,
    pub section: u32,
    pub source: PathBuf,
    /// Trim boundaries, copied verbatim from the label rows.
    pub start: String,
    pub end: String,
    /// `"{track:03}_Section{section}.{ext}"`
    pub output_name: String,
    /// The output name without its extension, written as title metadata.
    pub title: String,
}

impl SegmentSpec {
    /// Argument list for one encoder invocation, in final order: input,
    /// trim boundaries, codec options, title metadata, output path.
    pub fn encoder_args(&self, format: OutputFormat, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            OsString::from("-hide_banner"),
            OsString::from("-loglevel"),
            OsString::from("error"),
            OsString::from("-nostdin"),
            OsString::from("-y"),
            OsString::from("-i"),
            self.source.clone().into_os_string(),
            OsString::from("-vn"),
            OsString::from("-ss"),
            OsString::from(&self.start),
            OsString::from("-to"),
            OsString::from(&self.end),
        ];
        args.extend(format.codec_args().iter().map(OsString::from));
        args.push(OsString::from("-metadata"));
        args.push(OsString::from(format!("title={}", self.title)));
        args.push(output_path.as_os_str().to_owned());
        args
    }
}

/// Derive the ordered extraction plan for every track with a source.
///
/// Tracks whose section has no associated source recording are skipped. The
/// result is sorted by ascending track number and depends only on the
/// database contents and the format, so repeated calls yield identical
/// plans.
pub fn derive_segments(db: &TrackDatabase, format: OutputFormat) -> Vec<SegmentSpec> {
    db.tracks()
        .filter_map(|record| {
            let source = record.source.clone()?;
            let title = format!("{:03}_Section{}", record.number, record.section);
            Some(SegmentSpec {
                track: record.number,
                section: record.section,
                source,
                start: record.start.clone(),
                end: record.end.clone(),
                output_name: format!("{title}.{}", format.extension()),
                title,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{associate_sources, build_database};
    use crate::Course;

    fn sample_db() -> TrackDatabase {
        // Tracks 1-2 in section 1, 3-4 in section 2, 5-7 in section 3 and
        // track 8 alone in section 4; the final row of each file only
        // terminates its last track.
        let section_one = [
            "00:00:00.000\t-\t1",
            "00:12:30.500\t-\t2",
            "00:20:00.000\t-\t3",
        ];
        let section_two = ["00:00:00.000\t-\t3", "00:05:00.000\t-\t4", "00:09:00.000\t-\t5"];
        let section_three = [
            "00:00:00.000\t-\t5",
            "00:01:10.000\t-\t6",
            "00:03:20.000\t-\t7",
            "00:07:00.000\t-\t8",
        ];
        let section_four = ["00:00:00.000\t-\t8", "00:04:00.000\t-\t9"];
        let labels = [
            (1, section_one.join("\n")),
            (2, section_two.join("\n")),
            (3, section_three.join("\n")),
            (4, section_four.join("\n")),
        ];
        build_database(
            &labels,
            Course {
                sections: 4,
                tracks: 8,
            },
        )
        .expect("valid fixture labels")
    }

    #[test]
    fn output_naming_is_zero_padded_with_section_suffix() {
        let mut db = sample_db();
        associate_sources(&mut db, &[PathBuf::from("3-part.wav")]).unwrap();

        let plan = derive_segments(&db, OutputFormat::Mp3);
        let seventh = plan.iter().find(|spec| spec.track == 7).unwrap();
        assert_eq!(seventh.output_name, "007_Section3.mp3");
        assert_eq!(seventh.title, "007_Section3");
    }

    #[test]
    fn plan_is_sorted_by_track_regardless_of_association_order() {
        let mut db = sample_db();
        let sources = [
            PathBuf::from("4-d.wav"),
            PathBuf::from("1-a.wav"),
            PathBuf::from("3-c.wav"),
            PathBuf::from("2-b.wav"),
        ];
        associate_sources(&mut db, &sources).unwrap();

        let plan = derive_segments(&db, OutputFormat::Wav);
        let tracks: Vec<u32> = plan.iter().map(|spec| spec.track).collect();
        assert_eq!(tracks, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn tracks_without_a_source_are_excluded() {
        let mut db = sample_db();
        associate_sources(&mut db, &[PathBuf::from("2-b.wav")]).unwrap();

        let plan = derive_segments(&db, OutputFormat::Aac);
        let tracks: Vec<u32> = plan.iter().map(|spec| spec.track).collect();
        assert_eq!(tracks, vec![3, 4]);
        assert!(plan.iter().all(|spec| spec.source == Path::new("2-b.wav")));
    }

    #[test]
    fn derivation_is_idempotent() {
        let mut db = sample_db();
        associate_sources(&mut db, &[PathBuf::from("1-a.wav"), PathBuf::from("3-c.wav")])
            .unwrap();

        let first = derive_segments(&db, OutputFormat::Mp3);
        let second = derive_segments(&db, OutputFormat::Mp3);
        assert_eq!(first, second);
    }

    #[test]
    fn boundaries_are_passed_through_verbatim() {
        let mut db = sample_db();
        associate_sources(&mut db, &[PathBuf::from("1-a.wav")]).unwrap();

        let plan = derive_segments(&db, OutputFormat::Wav);
        assert_eq!(plan[0].start, "00:00:00.000");
        assert_eq!(plan[0].end, "00:12:30.500");
    }

    #[test]
    fn encoder_args_carry_trim_codec_and_metadata() {
        let spec = SegmentSpec {
            track: 7,
            section: 3,
            source: PathBuf::from("3-part.wav"),
            start: "00:03:20.000".to_owned(),
            end: "00:07:00.000".to_owned(),
            output_name: "007_Section3.m4a".to_owned(),
            title: "007_Section3".to_owned(),
        };

        let args = spec.encoder_args(OutputFormat::Aac, Path::new("out/007_Section3.m4a"));
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let input_at = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_at + 1], "3-part.wav");
        let start_at = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[start_at + 1], "00:03:20.000");
        let end_at = args.iter().position(|a| a == "-to").unwrap();
        assert_eq!(args[end_at + 1], "00:07:00.000");
        assert!(args.windows(2).any(|w| w == ["-b:a", "256k"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "title=007_Section3"]));
        assert_eq!(args.last().unwrap(), "out/007_Section3.m4a");
    }
}
