/// Output formats the encoder is asked to produce.
///
/// The set is closed on purpose: every format carries exactly one file
/// extension and one fixed codec-option set, so an exhaustive `match` covers
/// the whole dispatch table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// MPEG layer 3, highest-quality variable bitrate.
    Mp3,
    /// AAC in an MP4 container at a fixed 256 kbps.
    Aac,
    /// Lossless 16-bit PCM.
    Wav,
}

impl OutputFormat {
    /// File extension used for generated output names.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "m4a",
            OutputFormat::Wav => "wav",
        }
    }

    /// Codec arguments passed to the encoder for this format.
    pub fn codec_args(self) -> &'static [&'static str] {
        match self {
            OutputFormat::Mp3 => &["-c:a", "libmp3lame", "-q:a", "0"],
            OutputFormat::Aac => &["-c:a", "aac", "-b:a", "256k"],
            OutputFormat::Wav => &["-c:a", "pcm_s16le"],
        }
    }

    /// Name of the format as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "aac",
            OutputFormat::Wav => "wav",
        }
    }
}
