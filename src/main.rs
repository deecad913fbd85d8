use clap::{Arg, ArgAction, Command};
use numa_pagewatch::{
    queue_table, NodeQueues, QueueSnapshot, Result, Watch, WatchError, BINARY, DECIMAL,
};
use std::io::{self, ErrorKind, Write};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    match run() {
        Ok(()) => {}
        // The reader went away (e.g. piped into head); not worth a report.
        Err(WatchError::Io(e)) if e.kind() == ErrorKind::BrokenPipe => {}
        Err(e) => {
            eprintln!("numa-pagewatch: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let matches = Command::new("numa-pagewatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch per-NUMA-node page queue sizes as a periodically refreshing table")
        .arg(
            Arg::new("wait")
                .short('w')
                .long("wait")
                .value_name("SECONDS")
                .default_value("1")
                .value_parser(parse_interval)
                .help("Sampling interval in seconds"),
        )
        .arg(
            Arg::new("count")
                .short('c')
                .long("count")
                .value_name("TICKS")
                .value_parser(clap::value_parser!(u64))
                .help("Stop after this many samples (default: run until interrupted)"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("CHARS")
                .default_value("8")
                .value_parser(clap::value_parser!(usize))
                .help("Width budget for each numeric column"),
        )
        .arg(
            Arg::new("page-size")
                .long("page-size")
                .value_name("BYTES")
                .default_value("4096")
                .value_parser(clap::value_parser!(u64))
                .help("Bytes per page when converting page counts"),
        )
        .arg(
            Arg::new("si")
                .long("si")
                .action(ArgAction::SetTrue)
                .help("Use decimal (powers of 1000) prefixes instead of binary"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Take one snapshot, print it as JSON, and exit"),
        )
        .get_matches();

    let source = NodeQueues::new();

    if matches.get_flag("json") {
        let snapshot = QueueSnapshot::take(&source)?;
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| WatchError::Io(io::Error::other(e)))?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{json}").map_err(WatchError::Io)?;
        return Ok(());
    }

    let interval = *matches
        .get_one::<Duration>("wait")
        .unwrap_or(&Duration::from_secs(1));
    let width = matches.get_one::<usize>("width").copied().unwrap_or(8);
    let page_size = matches.get_one::<u64>("page-size").copied().unwrap_or(4096);
    let count = matches.get_one::<u64>("count").copied();
    let divisor = if matches.get_flag("si") { DECIMAL } else { BINARY };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::Relaxed))
            .map_err(|e| WatchError::Io(io::Error::other(e)))?;
    }

    let table = queue_table(width, divisor, page_size)?;
    let mut watch = Watch::new(interval, table, move || source.sample());
    let mut stdout = io::stdout().lock();
    watch.run(&mut stdout, &running, count)
}

fn parse_interval(s: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("interval must be a positive number of seconds".to_string());
    }
    Ok(Duration::from_secs_f64(secs))
}
