//! Command-line front end: draw a random sample of seeds from match files.

use std::path::PathBuf;
use std::thread::sleep;
use std::time::{Duration, Instant};

use seedpick::logging;
use seedpick::sampler::{
    MatchMode, MatchSampler, MatchSource, ProgressSnapshot, ScanOutcome, ScanRequest,
};
use seedpick::settings::{self, Settings, StrategyKind};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let mut settings = settings::load_or_default().map_err(|err| err.to_string())?;
    options.apply(&mut settings);
    let settings = settings.normalized();
    if options.write_config {
        let path = settings::save(&settings).map_err(|err| err.to_string())?;
        eprintln!("Saved settings to {}", path.display());
        return Ok(());
    }

    let source = options.source(&settings);
    let files = source.resolve().map_err(|err| err.to_string())?;
    if files.is_empty() {
        eprintln!("No match files found for {source:?}");
    }
    let request = ScanRequest::new(
        files,
        settings.sampler.strategy(),
        settings.sampler.reservoir_size,
        settings.filter.clone(),
    );
    let mut sampler = MatchSampler::new(settings.sampler.options())
        .with_result_names(settings.source.result_names());
    let mut handle = sampler.submit(request).map_err(|err| err.to_string())?;

    let started = Instant::now();
    let mut last: Option<ProgressSnapshot> = None;
    while !handle.is_finished() {
        if let Some(limit) = options.cancel_after
            && started.elapsed() >= limit
        {
            sampler.cancel(&handle);
        }
        sleep(settings.sampler.poll_interval());
        if let Some(snapshot) = sampler.poll(&mut handle).pop() {
            report_progress(&snapshot);
            last = Some(snapshot);
        }
    }
    eprintln!();

    let Some(last) = last else {
        return Err("Scan ended without a result".to_string());
    };
    let outcome = match last.terminal {
        Some(ScanOutcome::Canceled) => "canceled",
        _ => "completed",
    };
    eprintln!(
        "Scan {outcome}: {} qualifying record(s) in {} file(s), {} skipped, {:.1}s",
        last.qualifying_count,
        last.files_done,
        last.files_skipped,
        started.elapsed().as_secs_f64()
    );
    for seed in last.unique_sample() {
        println!("{seed}");
    }
    Ok(())
}

fn report_progress(snapshot: &ProgressSnapshot) {
    eprint!(
        "\r{:5.1}%  {} qualifying  {}/{} files",
        snapshot.fraction_complete * 100.0,
        snapshot.qualifying_count,
        snapshot.files_done,
        snapshot.files_total
    );
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    dir: Option<PathBuf>,
    file: Option<PathBuf>,
    strategy: Option<StrategyKind>,
    size: Option<usize>,
    bound: Option<usize>,
    mode: Option<MatchMode>,
    level: Option<u32>,
    name: Option<String>,
    result_names: Vec<String>,
    cancel_after: Option<Duration>,
    write_config: bool,
}

impl Options {
    /// Overlay command-line values on the loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.dir {
            settings.source.matches_dir = dir.clone();
        }
        if let Some(strategy) = self.strategy {
            settings.sampler.strategy = strategy;
        }
        if let Some(size) = self.size {
            settings.sampler.reservoir_size = size;
        }
        if let Some(bound) = self.bound {
            settings.sampler.per_file_bound = bound;
        }
        if let Some(mode) = self.mode {
            settings.filter.mode = mode;
        }
        if let Some(level) = self.level {
            settings.filter.level = level;
        }
        if let Some(name) = &self.name {
            settings.filter.selected_name = name.clone();
        }
        if !self.result_names.is_empty() {
            settings.source.result_names = self.result_names.clone();
        }
    }

    fn source(&self, settings: &Settings) -> MatchSource {
        match &self.file {
            Some(file) => MatchSource::File(file.clone()),
            None => settings.source.match_source(),
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--write-config" => options.write_config = true,
            "--dir" => options.dir = Some(PathBuf::from(value(&args, &mut idx, flag)?)),
            "--file" => options.file = Some(PathBuf::from(value(&args, &mut idx, flag)?)),
            "--strategy" => options.strategy = Some(value(&args, &mut idx, flag)?.parse()?),
            "--size" => options.size = Some(number(value(&args, &mut idx, flag)?, flag)?),
            "--bound" => options.bound = Some(number(value(&args, &mut idx, flag)?, flag)?),
            "--mode" => options.mode = Some(parse_mode(value(&args, &mut idx, flag)?)?),
            "--level" => options.level = Some(number(value(&args, &mut idx, flag)?, flag)?),
            "--name" => options.name = Some(value(&args, &mut idx, flag)?.to_string()),
            "--result-name" => options
                .result_names
                .push(value(&args, &mut idx, flag)?.to_string()),
            "--cancel-after-ms" => {
                let millis: u64 = number(value(&args, &mut idx, flag)?, flag)?;
                options.cancel_after = Some(Duration::from_millis(millis));
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    if options.dir.is_some() && options.file.is_some() {
        return Err("--dir and --file cannot be combined".to_string());
    }
    if options.size == Some(0) || options.bound == Some(0) {
        return Err("--size and --bound must be at least 1".to_string());
    }
    Ok(Some(options))
}

fn value<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn number<T: std::str::FromStr>(raw: &str, flag: &str) -> Result<T, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("{flag} expects a non-negative integer, got '{raw}'"))
}

fn parse_mode(raw: &str) -> Result<MatchMode, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "at-least" | "atleast" | "min" => Ok(MatchMode::AtLeast),
        "exact" | "eq" => Ok(MatchMode::Exact),
        other => Err(format!("Unknown mode '{other}' (expected at-least or exact)")),
    }
}

fn help_text() -> String {
    [
        "seedpick",
        "",
        "Draws a uniform random sample of seeds from match files.",
        "Defaults come from config.toml in the .seedpick directory.",
        "",
        "Usage:",
        "  seedpick [--dir <dir> | --file <path>] [options]",
        "",
        "Options:",
        "  --dir <dir>             Directory holding matches_*.csv files.",
        "  --file <path>           Sample a single match file.",
        "  --strategy <name>       full, per-file or random-probe.",
        "  --size <n>              Number of seeds to draw.",
        "  --bound <n>             Per-file bound for per-file and random-probe.",
        "  --mode <mode>           at-least or exact level comparison.",
        "  --level <n>             Level compared against each record.",
        "  --name <name>           Only records for this result name.",
        "  --result-name <name>    Result name for the next level (repeatable).",
        "  --cancel-after-ms <ms>  Cancel and keep the partial sample after a delay.",
        "  --write-config          Save the effective settings and exit.",
    ]
    .join("\n")
}
