//! discovery-latency: compute a discovery latency distribution and print a
//! JSON summary.
//!
//! Either pass every parameter as a flag or point `--config` at a JSON
//! experiment file; flags override values read from the file.

use std::path::PathBuf;

use discovery_latency::config::{EngineKind, ExperimentConfig};
use discovery_latency::constants::DEFAULT_MAX_ADV_DELAY;
use discovery_latency::env_config::{init_rayon_threads, init_tracing};
use discovery_latency::experiment;
use discovery_latency::logging::{RunLog, Verbosity};

fn print_usage() {
    eprintln!(
        "Usage: discovery-latency [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --engine <fixed|alternation|lossy|exact>  Engine (default: fixed)\n\
         \x20 --adv <T>               Advertising interval\n\
         \x20 --seq <a,b,c>           Alternation sequence of advertising intervals\n\
         \x20 --scan-interval <T>     Scan interval\n\
         \x20 --scan-window <T>       Scan window\n\
         \x20 --end <T>               Horizon; later discoveries count as timeout\n\
         \x20 --loss <PERCENT>        Per-event loss rate in percent (default: 0)\n\
         \x20 --delay <T>             Maximum advertising jitter (default: {DEFAULT_MAX_ADV_DELAY})\n\
         \x20 --cdf                   Include the full CDF in the summary\n\
         \x20 --validate <N>          Cross-validate against N sampler draws\n\
         \x20 --seed <S>              Sampler seed (default: 42)\n\
         \x20 --config <FILE>         Load an experiment from JSON\n\
         \x20 --verbose               Log per-event progress\n\
         \x20 -h, --help              Print this help"
    );
}

/// Flags collected before they are merged into an [`ExperimentConfig`].
#[derive(Default)]
struct Flags {
    config_path: Option<PathBuf>,
    engine: Option<EngineKind>,
    adv: Option<u64>,
    sequence: Option<Vec<u64>>,
    scan_interval: Option<u64>,
    scan_window: Option<u64>,
    end_time: Option<u64>,
    loss_percent: Option<f64>,
    delay: Option<u64>,
    cdf: bool,
    validate: Option<usize>,
    seed: Option<u64>,
    verbose: bool,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    print_usage();
    std::process::exit(1);
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i) {
        Some(v) => v.as_str(),
        None => fail(format!("Missing value for {flag}")),
    }
}

fn parse_num<T: std::str::FromStr>(s: &str, flag: &str) -> T {
    s.parse()
        .unwrap_or_else(|_| fail(format!("Invalid {flag} value: {s}")))
}

fn parse_flags(args: &[String]) -> Option<Flags> {
    let mut flags = Flags::default();
    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--engine" => {
                i += 1;
                let name = value(args, i, flag);
                flags.engine = Some(
                    EngineKind::parse(name)
                        .unwrap_or_else(|| fail(format!("Unknown engine: {name}"))),
                );
            }
            "--adv" => {
                i += 1;
                flags.adv = Some(parse_num(value(args, i, flag), flag));
            }
            "--seq" => {
                i += 1;
                let seq = value(args, i, flag)
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| parse_num(s.trim(), flag))
                    .collect();
                flags.sequence = Some(seq);
            }
            "--scan-interval" => {
                i += 1;
                flags.scan_interval = Some(parse_num(value(args, i, flag), flag));
            }
            "--scan-window" => {
                i += 1;
                flags.scan_window = Some(parse_num(value(args, i, flag), flag));
            }
            "--end" => {
                i += 1;
                flags.end_time = Some(parse_num(value(args, i, flag), flag));
            }
            "--loss" => {
                i += 1;
                flags.loss_percent = Some(parse_num(value(args, i, flag), flag));
            }
            "--delay" => {
                i += 1;
                flags.delay = Some(parse_num(value(args, i, flag), flag));
            }
            "--validate" => {
                i += 1;
                flags.validate = Some(parse_num(value(args, i, flag), flag));
            }
            "--seed" => {
                i += 1;
                flags.seed = Some(parse_num(value(args, i, flag), flag));
            }
            "--config" => {
                i += 1;
                flags.config_path = Some(PathBuf::from(value(args, i, flag)));
            }
            "--cdf" => flags.cdf = true,
            "--verbose" | "-v" => flags.verbose = true,
            "--help" | "-h" => {
                print_usage();
                return None;
            }
            other => fail(format!("Unknown argument: {other}")),
        }
        i += 1;
    }
    Some(flags)
}

fn require(v: Option<u64>, flag: &str) -> u64 {
    v.unwrap_or_else(|| fail(format!("{flag} is required without --config")))
}

fn build_config(flags: Flags) -> discovery_latency::Result<ExperimentConfig> {
    let mut cfg = match &flags.config_path {
        Some(path) => ExperimentConfig::load(path)?,
        None => ExperimentConfig {
            engine: EngineKind::Fixed,
            adv_interval: None,
            sequence: Vec::new(),
            scan_interval: require(flags.scan_interval, "--scan-interval"),
            scan_window: require(flags.scan_window, "--scan-window"),
            end_time: require(flags.end_time, "--end"),
            loss_percent: 0.0,
            max_adv_delay: DEFAULT_MAX_ADV_DELAY,
            cdf: false,
            validate: None,
            seed: 42,
        },
    };
    if let Some(engine) = flags.engine {
        cfg.engine = engine;
    }
    if let Some(adv) = flags.adv {
        cfg.adv_interval = Some(adv);
    }
    if let Some(seq) = flags.sequence {
        cfg.sequence = seq;
    }
    if let Some(s) = flags.scan_interval {
        cfg.scan_interval = s;
    }
    if let Some(w) = flags.scan_window {
        cfg.scan_window = w;
    }
    if let Some(end) = flags.end_time {
        cfg.end_time = end;
    }
    if let Some(loss) = flags.loss_percent {
        cfg.loss_percent = loss;
    }
    if let Some(delay) = flags.delay {
        cfg.max_adv_delay = delay;
    }
    if flags.validate.is_some() {
        cfg.validate = flags.validate;
    }
    if let Some(seed) = flags.seed {
        cfg.seed = seed;
    }
    cfg.cdf |= flags.cdf;
    Ok(cfg)
}

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    let Some(flags) = parse_flags(&args) else {
        return;
    };
    let verbosity = if flags.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let cfg = match build_config(flags) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    if cfg.validate.is_some() {
        init_rayon_threads();
    }

    let log = RunLog::new("latency", verbosity);
    match experiment::run(&cfg, log) {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("cannot serialize summary: {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            if e.is_skippable() {
                tracing::error!("skipped: {e}");
            } else {
                tracing::error!("{e}");
            }
            std::process::exit(e.exit_status());
        }
    }
}
