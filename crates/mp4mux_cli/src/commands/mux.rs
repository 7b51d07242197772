//! Mux command implementation.

use crate::input_spec::InputFileSpec;
use clap::Args;
use mp4mux_core::{
    ConsistencyMode, InputSpec, MuxConfig, MuxReport, Muxer, OutputTarget, StreamConfig,
    ValidatingEngine,
};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Arguments for the mux command.
#[derive(Debug, Args)]
pub struct MuxArgs {
    /// Add an elementary stream to the MP4 container. Comma delimited
    /// parameters: <file> (mandatory), lang=<language>, name=<name>,
    /// ts=<timescale>, fr=<framerate> (video only, e.g. 23.97 or
    /// 24000/1001)
    #[arg(
        short = 'i',
        long = "input-file",
        value_name = "FILE[,key=value...]",
        required = true,
        value_parser = crate::input_spec::parse_input_spec
    )]
    pub input_file: Vec<InputFileSpec>,

    /// Output .mp4 file name
    #[arg(short = 'o', long = "output-file", value_name = "FILE")]
    pub output_file: PathBuf,

    /// Overwrites the existing output .mp4 file if there is one
    #[arg(long)]
    pub overwrite: bool,

    /// Overrides the timescale of the entire presentation
    #[arg(long, value_name = "arg")]
    pub mpeg4_timescale: Option<u32>,

    /// ISO base media file format major brand
    #[arg(long, value_name = "arg")]
    pub mpeg4_brand: Option<String>,

    /// ISO base media file format compatible brand(s) as a comma
    /// separated list, for example mp42,iso6,isom,msdh,dby1
    #[arg(long, value_name = "arg")]
    pub mpeg4_comp_brand: Option<String>,

    /// Output file format: 'mp4' (flat) or 'frag-mp4' (fragmented)
    #[arg(long, value_name = "arg", default_value = "mp4", value_parser = ["mp4", "frag-mp4"])]
    pub output_format: String,

    /// Maximum fragment duration in milliseconds
    #[arg(long, value_name = "arg")]
    pub mpeg4_max_frag_duration: Option<u32>,

    /// Dolby Vision profile: 4, 5, 7, 8 or 9. Profile 8 requires
    /// --dv-bl-compatible-id
    #[arg(long, value_name = "arg", requires_if("8", "dv_bl_compatible_id"))]
    pub dv_profile: Option<u8>,

    /// Dolby Vision base-layer compatible ID: 1, 2 or 4
    #[arg(long, value_name = "arg")]
    pub dv_bl_compatible_id: Option<u8>,

    /// Stream index (starting 0) whose HEVC sample entry box is named
    /// 'dvh1' instead of the default 'dvhe'
    #[arg(long, value_name = "stream index", conflicts_with = "hvc1flag")]
    pub dvh1flag: Option<usize>,

    /// Stream index (starting 0) whose HEVC sample entry box is named
    /// 'hvc1' instead of the default 'hev1'
    #[arg(long, value_name = "stream index")]
    pub hvc1flag: Option<usize>,

    /// Fail instead of silently repairing inconsistent interleave
    /// settings
    #[arg(long)]
    pub strict: bool,

    /// Report format (text, json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub report: String,
}

/// What one mux run did, for the text and JSON reports.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Repairs made by the consistency pass.
    pub adjustments: Vec<String>,
    /// The normalized global configuration.
    pub config: MuxConfig,
    /// The normalized per-stream configurations.
    pub streams: Vec<StreamConfig>,
    /// The engine's verdict.
    pub engine: MuxReport,
}

/// Runs the mux command.
pub fn run(args: &MuxArgs) -> Result<(), Box<dyn std::error::Error>> {
    let report = execute(args)?;

    match args.report.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&report),
    }

    Ok(())
}

/// Drives one muxer session from parsed arguments.
pub fn execute(args: &MuxArgs) -> Result<RunReport, Box<dyn std::error::Error>> {
    // Every input must be openable before the session is built.
    for file in &args.input_file {
        if let Err(err) = OpenOptions::new().read(true).open(&file.path) {
            return Err(format!(
                "failed to open input file {:?}: {err}",
                file.path.display().to_string()
            )
            .into());
        }
    }

    // Without --overwrite an existing output file is an error.
    if args.output_file.exists() && !args.overwrite {
        return Err(format!(
            "output file {:?} already exists, pass --overwrite to replace it",
            args.output_file.display().to_string()
        )
        .into());
    }

    let mut muxer = Muxer::new();
    if args.strict {
        muxer.set_consistency_mode(ConsistencyMode::Strict)?;
    }

    for file in &args.input_file {
        if let Some(rate) = file.framerate {
            muxer.set_video_framerate(rate.numerator, rate.denominator)?;
        }
        tracing::info!(path = %file.path.display(), "adding elementary stream");
        muxer.set_input(InputSpec {
            path: file.path.clone(),
            language: file.language.clone(),
            track_name: file.track_name.clone(),
            encoder_name: None,
            time_scale: file.time_scale.unwrap_or(0),
            chunk_span_size: 0,
            track_id: 0,
        })?;
    }

    muxer.set_output(OutputTarget::File(args.output_file.clone()))?;

    if let Some(timescale) = args.mpeg4_timescale {
        muxer.set_moov_timescale(timescale)?;
    }
    if let Some(brand) = &args.mpeg4_brand {
        muxer.set_major_brand(brand)?;
    }
    if let Some(brands) = &args.mpeg4_comp_brand {
        for brand in brands.split(',') {
            muxer.add_compatible_brand(brand)?;
        }
    }

    muxer.set_output_format(&args.output_format)?;
    if muxer.config().is_fragmented() {
        // Fragment boundaries drive interleaving; drop the flat-output
        // interleave default so strict mode has nothing to repair.
        muxer.set_chunk_span_time(0)?;
    }

    if let Some(duration) = args.mpeg4_max_frag_duration {
        muxer.set_max_fragment_duration(duration)?;
    }
    if let Some(profile) = args.dv_profile {
        muxer.set_dolby_vision_profile(profile)?;
    }
    if let Some(id) = args.dv_bl_compatible_id {
        muxer.set_dolby_vision_bl_compatible_id(id)?;
    }
    if let Some(stream) = args.dvh1flag {
        muxer.mark_sample_entry_dvh1(stream)?;
    }
    if let Some(stream) = args.hvc1flag {
        muxer.mark_sample_entry_hvc1(stream)?;
    }

    let adjustments = if args.strict {
        Vec::new()
    } else {
        muxer.run_consistency_check()?
    };

    let engine_report = muxer.start(&mut ValidatingEngine::new())?;

    Ok(RunReport {
        adjustments: adjustments.iter().map(ToString::to_string).collect(),
        config: muxer.config().clone(),
        streams: muxer.streams().to_vec(),
        engine: engine_report,
    })
}

fn print_text(report: &RunReport) {
    let layout = if report.engine.fragmented {
        "fragmented"
    } else {
        "flat"
    };
    println!(
        "muxed {} track(s) to {} ({layout})",
        report.engine.track_count, report.engine.destination
    );

    for (slot, stream) in report.streams.iter().enumerate() {
        let mut line = format!("  stream {slot}: {}", stream.path.display());
        if let Some(lang) = &stream.language {
            line.push_str(&format!(" lang={lang}"));
        }
        if let Some(name) = &stream.track_name {
            line.push_str(&format!(" name={name:?}"));
        }
        if stream.time_scale != 0 {
            line.push_str(&format!(" ts={}", stream.time_scale));
        }
        if let Some(entry) = stream.sample_entry {
            line.push_str(&format!(" sample_entry={entry}"));
        }
        println!("{line}");
    }

    if !report.adjustments.is_empty() {
        println!("normalized before start:");
        for adjustment in &report.adjustments {
            println!("  {adjustment}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base_args(dir: &std::path::Path, inputs: &[&str]) -> MuxArgs {
        let input_file = inputs
            .iter()
            .map(|name| {
                let path = dir.join(name);
                fs::write(&path, [0u8, 0, 0, 1]).unwrap();
                InputFileSpec {
                    path,
                    language: None,
                    track_name: None,
                    time_scale: None,
                    framerate: None,
                }
            })
            .collect();

        MuxArgs {
            input_file,
            output_file: dir.join("out.mp4"),
            overwrite: false,
            mpeg4_timescale: None,
            mpeg4_brand: None,
            mpeg4_comp_brand: None,
            output_format: "mp4".to_string(),
            mpeg4_max_frag_duration: None,
            dv_profile: None,
            dv_bl_compatible_id: None,
            dvh1flag: None,
            hvc1flag: None,
            strict: false,
            report: "text".to_string(),
        }
    }

    #[test]
    fn flat_run_produces_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let args = base_args(dir.path(), &["video.h265", "audio.ec3"]);

        let report = execute(&args).unwrap();
        assert_eq!(report.engine.track_count, 2);
        assert!(!report.engine.fragmented);
        assert!(report.adjustments.is_empty());
    }

    #[test]
    fn fragmented_run_with_dolby_vision_options() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path(), &["video.h265"]);
        args.output_format = "frag-mp4".to_string();
        args.mpeg4_comp_brand = Some("mp42,iso6,isom,msdh,dby1".to_string());
        args.dv_profile = Some(8);
        args.dv_bl_compatible_id = Some(2);
        args.dvh1flag = Some(0);

        let report = execute(&args).unwrap();
        assert!(report.engine.fragmented);
        assert_eq!(report.config.chunk_span_time, 0);
        assert_eq!(report.config.compatible_brands.len(), 5);
        // The frag default is set explicitly, so nothing needed repair.
        assert!(report.adjustments.is_empty());
    }

    #[test]
    fn strict_fragmented_run_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path(), &["video.h265"]);
        args.output_format = "frag-mp4".to_string();
        args.strict = true;

        let report = execute(&args).unwrap();
        assert!(report.engine.fragmented);
        assert!(report.adjustments.is_empty());
    }

    #[test]
    fn missing_input_is_reported_before_the_session_is_built() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path(), &["video.h265"]);
        args.input_file[0].path = dir.path().join("missing.h265");

        let err = execute(&args).unwrap_err();
        assert!(err.to_string().contains("failed to open input file"));
    }

    #[test]
    fn existing_output_requires_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path(), &["video.h265"]);
        fs::write(&args.output_file, b"old").unwrap();

        let err = execute(&args).unwrap_err();
        assert!(err.to_string().contains("--overwrite"));

        args.overwrite = true;
        assert!(execute(&args).is_ok());
    }

    #[test]
    fn sample_entry_flag_is_bounds_checked() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path(), &["video.h265"]);
        args.hvc1flag = Some(5);

        let err = execute(&args).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }
}
