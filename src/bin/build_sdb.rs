use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use sampledb::{
    samples_from_files, AudioType, CollectionConfig, CollectionError, SdbWriter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetAudio {
    Wav,
    Opus,
}

impl TargetAudio {
    fn audio_type(self) -> AudioType {
        match self {
            Self::Wav => AudioType::Wav,
            Self::Opus => AudioType::Opus,
        }
    }
}

/// Bundle one or more sample collections into a single sample database.
#[derive(Debug, Parser)]
#[command(name = "build_sdb")]
struct Args {
    /// Source collections (.sdb or .csv), merged in duration order.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Target sample database file.
    #[arg(short = 'o', long = "output")]
    target: PathBuf,

    /// Audio type declared for the target's speech column. Writing a type
    /// other than the sources' one needs a codec converter; the default
    /// passthrough only accepts matching samples.
    #[arg(long, value_enum, default_value = "wav")]
    audio_type: TargetAudio,

    /// Tracking-id prefix recorded while writing (defaults to the target path).
    #[arg(long)]
    id_prefix: Option<String>,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CollectionError> {
    let config = CollectionConfig::default();
    let mut samples = samples_from_files(&args.sources, &config)?;

    let mut writer = SdbWriter::create(&args.target, args.audio_type.audio_type())?;
    if let Some(id_prefix) = args.id_prefix {
        writer = writer.with_id_prefix(id_prefix);
    }

    let progress = ProgressBar::new(samples.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut failed = 0usize;
    for sample in samples.iter() {
        match sample {
            Ok(sample) => {
                writer.add(&sample)?;
            }
            Err(err) => {
                failed += 1;
                progress.println(format!("skipping unreadable sample: {err}"));
            }
        }
        progress.inc(1);
    }
    writer.close()?;
    progress.finish_and_clear();

    println!(
        "wrote {} samples to {}",
        writer.len(),
        args.target.display()
    );
    if failed > 0 {
        println!("skipped {failed} unreadable samples");
    }
    Ok(())
}
