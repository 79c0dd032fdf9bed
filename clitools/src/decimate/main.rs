/** Run modulator bitstreams through the CIC decimators: dump samples to stdout or a WAV file,
watch the debug pins, or check the spectrum of the decimated signal */
mod logger;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use thiserror::Error;

use cic::analysis::{compute_rms_mean, dominates, SpectrumAnalyzer};
use cic::bitstream::{self, BitstreamError, Format};
use cic::buffer::SampleBuffer;
use cic::debug::reassemble;
use cic::generation::{random_bits, ToneBitstream};
use cic::{FilterBank, Order, DECIMATION, FIRST_ORDER_BITS, SECOND_ORDER_BITS};

const MAX_CAPTURE: usize = 4096;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Bitstream(#[from] BitstreamError),

    #[error("wav output: {0}")]
    Wav(#[from] hound::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("bitstream ran out after {got} of {wanted} samples")]
    ShortCapture { wanted: usize, got: usize },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Text,
    Packed,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Format::Text,
            FormatArg::Packed => Format::Packed,
        }
    }
}

#[derive(clap::Args, Debug)]
struct Input {
    /// Bitstream file
    input: PathBuf,

    /// Filter order
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    order: u8,

    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,

    /// Ticks to hold reset before streaming
    #[arg(long, default_value_t = 10)]
    reset_ticks: usize,
}

impl Input {
    fn order(&self) -> Order {
        Order::from_select(self.order == 2)
    }

    fn output_bits(&self) -> u32 {
        match self.order() {
            Order::First => FIRST_ORDER_BITS,
            Order::Second => SECOND_ORDER_BITS,
        }
    }

    fn load(&self) -> Result<Vec<bool>, CliError> {
        let reader = BufReader::new(File::open(&self.input)?);
        let bits = bitstream::read(reader, self.format.into())?;
        info!("{}: {} bits", self.input.display(), bits.len());
        Ok(bits)
    }

    /// A filter bank that has been held in reset for `reset_ticks`
    fn bank(&self) -> FilterBank {
        let mut bank = FilterBank::new(self.order());
        for _ in 0..self.reset_ticks {
            bank.tick(false, true);
        }
        bank
    }
}

#[derive(Parser, Debug)]
#[command(name = "decimate", version, about = "CIC decimation of 1-bit modulator streams")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every decimated sample, optionally writing them to a WAV file
    Run {
        #[command(flatten)]
        input: Input,

        /// WAV file for the decimated samples
        #[arg(long)]
        wav: Option<PathBuf>,

        /// Base (modulator) clock rate in Hz, used for the WAV sample rate
        #[arg(long, default_value_t = 100_000, value_parser = clap::value_parser!(u32).range(DECIMATION as i64..))]
        clock_hz: u32,

        /// Do not print samples
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print the debug pins on every rising strobe edge
    Debug {
        #[command(flatten)]
        input: Input,

        /// Debug mode select (0-15)
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..16))]
        mode: u8,

        /// Byte on the bidirectional inputs, echoed in loopback mode
        #[arg(long, default_value = "0", value_parser = parse_byte)]
        loopback: u8,
    },
    /// Capture samples on strobe edges and report level and dominant frequency bin
    Spectrum {
        #[command(flatten)]
        input: Input,

        /// Number of samples to analyse
        #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u16).range(2..=MAX_CAPTURE as i64))]
        samples: u16,

        /// Strobe edges to skip while the pipeline fills
        #[arg(long, default_value_t = 3)]
        skip: usize,
    },
    /// Write a stimulus bitstream
    Generate {
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,

        /// Length in decimation periods
        #[arg(long, default_value_t = 70)]
        periods: usize,

        /// Tone frequency as a bin of a `--window`-sample spectrum
        #[arg(long, default_value_t = 3)]
        bin: usize,

        #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u16).range(1..))]
        window: u16,

        /// Peak density swing around 0.5
        #[arg(long, default_value_t = 0.4, value_parser = parse_amplitude)]
        amplitude: f64,

        /// Emit random bits with this density instead of a tone
        #[arg(long, value_parser = parse_density)]
        random: Option<f64>,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte {:?}: {}", s, e))
}

fn parse_fraction(s: &str, max: f64) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("invalid number {:?}: {}", s, e))?;
    if !(0.0..=max).contains(&value) {
        return Err(format!("{} is outside [0, {}]", value, max));
    }
    Ok(value)
}

fn parse_density(s: &str) -> Result<f64, String> {
    parse_fraction(s, 1.0)
}

fn parse_amplitude(s: &str) -> Result<f64, String> {
    parse_fraction(s, 0.5)
}

fn run(input: &Input, wav: Option<&Path>, clock_hz: u32, quiet: bool) -> Result<(), CliError> {
    let bits = input.load()?;
    let mut bank = input.bank();

    let mut writer = match wav {
        Some(path) => {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: clock_hz / DECIMATION as u32,
                bits_per_sample: if input.output_bits() <= 16 { 16 } else { 24 },
                sample_format: hound::SampleFormat::Int,
            };
            info!("writing {} Hz wav to {}", spec.sample_rate, path.display());
            Some(hound::WavWriter::create(path, spec)?)
        }
        None => None,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut count = 0usize;
    let mut saturated = 0usize;
    for bit in bits {
        if let Some(sample) = bank.tick(bit, false) {
            count += 1;
            if bank.diagnostics().saturated {
                saturated += 1;
            }
            if !quiet {
                writeln!(out, "{}", sample)?;
            }
            if let Some(w) = writer.as_mut() {
                w.write_sample(sample as i32)?;
            }
        }
    }
    out.flush()?;
    if let Some(w) = writer {
        w.finalize()?;
    }

    info!("{} samples", count);
    if saturated > 0 {
        warn!("{} of {} samples saturated", saturated, count);
    }
    Ok(())
}

fn debug(input: &Input, mode: u8, loopback: u8) -> Result<(), CliError> {
    let bits = input.load()?;
    let mut bank = input.bank();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut last_strobe = bank.strobe();
    let mut edge = 0usize;
    for bit in bits {
        bank.tick(bit, false);
        let strobe = bank.strobe();
        if strobe && !last_strobe {
            let pins = bank.pins(mode, loopback);
            writeln!(
                out,
                "{:5} uo_out=0x{:02X} uio_out=0x{:02X} data={}",
                edge,
                pins.uo_out,
                pins.uio_out,
                reassemble(pins)
            )?;
            edge += 1;
        }
        last_strobe = strobe;
    }
    out.flush()?;
    Ok(())
}

fn spectrum(input: &Input, samples: usize, skip: usize) -> Result<(), CliError> {
    let bits = input.load()?;
    let mut bank = input.bank();

    let mut buf = SampleBuffer::<MAX_CAPTURE>::new().with_skip(skip);
    for bit in bits {
        if buf.len() >= samples {
            break;
        }
        bank.tick(bit, false);
        // capacity is at least `samples`, so this never rejects
        let _ = buf.observe(bank.strobe(), bank.output());
    }
    if buf.len() < samples {
        return Err(CliError::ShortCapture { wanted: samples, got: buf.len() });
    }

    let full_scale = (1u32 << input.output_bits()) - 1;
    let (db_fs, mean) = compute_rms_mean(buf.as_slice(), full_scale);
    let analyzer = SpectrumAnalyzer::new(samples);
    let mags = analyzer.magnitudes(buf.as_slice()).unwrap_or_default();
    let peak = analyzer.dominant_bin(buf.as_slice());

    println!("samples:  {}", samples);
    println!("mean:     {:.1} ({:.3} of full scale)", mean, mean / full_scale as f32);
    println!("level:    {:.2} dBFS", db_fs);
    match peak {
        Some(bin) => {
            println!("peak bin: {} ({:.1})", bin, mags[bin]);
            println!("dominant: {}", dominates(&mags, bin, 20));
        }
        None => println!("peak bin: none"),
    }
    Ok(())
}

fn generate(
    output: &Path,
    format: Format,
    periods: usize,
    tone: (usize, usize, f64),
    random: Option<f64>,
    seed: u64,
) -> Result<(), CliError> {
    let len = periods * DECIMATION;
    let bits = match random {
        Some(density) => random_bits(seed, len, density),
        None => {
            let (bin, window, amplitude) = tone;
            ToneBitstream::on_bin(bin, window, DECIMATION, amplitude).take(len).collect()
        }
    };
    let writer = BufWriter::new(File::create(output)?);
    match format {
        Format::Text => bitstream::write_text(writer, &bits)?,
        Format::Packed => bitstream::write_packed(writer, &bits)?,
    }
    info!("wrote {} bits to {}", bits.len(), output.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result = match &cli.command {
        Command::Run { input, wav, clock_hz, quiet } => run(input, wav.as_deref(), *clock_hz, *quiet),
        Command::Debug { input, mode, loopback } => debug(input, *mode, *loopback),
        Command::Spectrum { input, samples, skip } => spectrum(input, *samples as usize, *skip),
        Command::Generate { output, format, periods, bin, window, amplitude, random, seed } => {
            generate(output, (*format).into(), *periods, (*bin, *window as usize, *amplitude), *random, *seed)
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
