use clap::Parser;
use serial_handler::config::{Config, ConfigLoader};
use serial_handler::logging::init_tracing;
use serial_handler::port::{Handshake, Parity, StopBits};
use serial_handler::{SerialPortHandler, TextEncoding};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Watch a serial port and print what arrives.",
    long_about = "Opens a serial port, prints received text to stdout and writes each line read from stdin to the port. The port is closed when stdin reaches end of file."
)]
struct Args {
    /// Port name or alias (e.g. /dev/ttyUSB0, COM3).
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    #[arg(long, value_enum)]
    parity: Option<Parity>,

    /// Data bits, 5 to 8.
    #[arg(long)]
    data_bits: Option<u8>,

    #[arg(long, value_enum)]
    stop_bits: Option<StopBits>,

    #[arg(long, value_enum)]
    handshake: Option<Handshake>,

    /// How received bytes are turned into text.
    #[arg(short, long, value_enum)]
    encoding: Option<TextEncoding>,

    /// Line ending appended to each stdin line before it is written.
    #[arg(long, default_value = "\r\n")]
    line_ending: String,

    /// Configuration file; otherwise the standard locations are searched.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Command-line flags win over the file and the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(port) = &self.port {
            config.serial.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(parity) = self.parity {
            config.serial.parity = parity;
        }
        if let Some(data_bits) = self.data_bits {
            config.serial.data_bits = data_bits;
        }
        if let Some(stop_bits) = self.stop_bits {
            config.serial.stop_bits = stop_bits;
        }
        if let Some(handshake) = self.handshake {
            config.serial.handshake = handshake;
        }
        if let Some(encoding) = self.encoding {
            config.reader.encoding = encoding;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    args.apply(&mut config);
    init_tracing(&config.logging);

    let handler = SerialPortHandler::from_config(&config)?;
    handler.subscribe(|text| {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    });
    handler.subscribe_faults(|event| {
        if event.is_device_lost() {
            error!("{event}");
        }
    });
    handler.open()?;
    info!(port = handler.port_name(), "monitoring; end input with Ctrl+D (Ctrl+Z on Windows)");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let payload = format!("{line}{}", args.line_ending);
        if let Err(e) = handler.write(payload.as_bytes()) {
            warn!(error = %e, "write failed");
        }
    }

    handler.dispose();
    Ok(())
}
