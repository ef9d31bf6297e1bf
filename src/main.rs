use std::env;
use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use raster_codec::config::CodecConfig;
use raster_codec::persistence::FilePersistence;
use raster_codec::stats::RecordingStatistics;
use raster_codec::{CodecKind, ImageCodec, Raster};

const USAGE: &str = "usage:
  raster-codec compress   <rle|bitplane|huffman|packed> <input.gray> <output>
  raster-codec decompress <rle|bitplane|huffman|packed> <input> <output.gray>

set RASTER_CODEC_CONFIG to a JSON file to override extensions";

fn load_config() -> Result<CodecConfig> {
    match env::var_os("RASTER_CODEC_CONFIG") {
        Some(path) => CodecConfig::from_json_file(&path)
            .with_context(|| format!("reading config {}", path.to_string_lossy())),
        None => Ok(CodecConfig::default()),
    }
}

fn run(args: &[String]) -> Result<()> {
    let [command, kind, input, output] = args else {
        bail!("{USAGE}");
    };
    let kind: CodecKind = kind.parse()?;
    let sink = std::sync::Arc::new(RecordingStatistics::new());
    let codec = ImageCodec::with_sink(load_config()?, sink.clone());

    match command.as_str() {
        "compress" => {
            let bytes = fs::read(input).with_context(|| format!("reading {input}"))?;
            let raster = Raster::from_raw_bytes(bytes)
                .with_context(|| format!("{input} is not a 512x512 8-bit raw image"))?;
            let path = codec.compress_to(&raster, kind, &FilePersistence::new(output))?;
            println!("wrote {}", path.display());
        }
        "decompress" => {
            let raster = codec
                .decompress_from(kind, &FilePersistence::new(input))
                .with_context(|| format!("decoding {input}"))?;
            fs::write(output, raster.into_raw_bytes())
                .with_context(|| format!("writing {output}"))?;
            println!("wrote {output}");
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }

    for stats in sink.records() {
        println!("{stats}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
