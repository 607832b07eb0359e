use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log files larger than this are trimmed when logging starts (5 MB)
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;
/// Bytes of recent history kept by a trim (1 MB)
const KEEP_SIZE: u64 = 1024 * 1024;

/// At most the last `keep` bytes of a `len`-byte log, cut at a line start.
///
/// Reads one byte before the cut so a cut that lands exactly after a newline
/// keeps the whole following line.
fn log_tail<R: Read + Seek>(reader: &mut R, len: u64, keep: u64) -> io::Result<Vec<u8>> {
    if len <= keep {
        reader.seek(SeekFrom::Start(0))?;
        let mut all = Vec::new();
        reader.read_to_end(&mut all)?;
        return Ok(all);
    }

    reader.seek(SeekFrom::Start(len - keep - 1))?;
    let mut tail = Vec::new();
    reader.read_to_end(&mut tail)?;
    let partial = tail
        .iter()
        .position(|&b| b == b'\n')
        .map_or(tail.len(), |i| i + 1);
    tail.drain(..partial);
    Ok(tail)
}

/// Trim `path` to its recent tail when it has outgrown [`MAX_LOG_SIZE`]
fn rotate_log_if_needed(path: &Path) -> io::Result<()> {
    let len = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if len <= MAX_LOG_SIZE {
        return Ok(());
    }

    let tail = log_tail(&mut File::open(path)?, len, KEEP_SIZE)?;
    let mut file = File::create(path)?;
    writeln!(
        file,
        "--- Log rotated, {} older bytes removed ---",
        len - tail.len() as u64
    )?;
    file.write_all(&tail)
}

/// Default filter directive for a `--log-level` value. The level applies to
/// both crates so cache load statistics from the core show up at `info`.
fn default_filter(level: &str) -> String {
    format!("sweepplot={level},sweepplot_core={level}")
}

fn subscriber(
    filter: EnvFilter,
    writer: BoxMakeWriter,
    ansi: bool,
) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(false),
    )
}

/// Initialize logging.
///
/// Logs go to stderr unless `log_file` is given, in which case they are
/// appended to that file; a file over 5MB is first cut down to its last 1MB.
/// `RUST_LOG` overrides the level given here.
pub fn init_logging(log_file: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let (writer, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            if let Err(e) = rotate_log_if_needed(path) {
                eprintln!("Warning: Failed to rotate log file: {e}");
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));
    subscriber(filter, writer, ansi).init();

    tracing::debug!(log_file = ?log_file, "Logging initialized");
    Ok(())
}
