// Entry point: runs one titration session for a single chamber and writes
// the session record as JSON.
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use staircase::cli::Args;
use staircase::config::AppConfig;
use staircase::core::quest::ThresholdEstimator;
use staircase::session::Chamber;
use staircase::session::observer::{Observation, ResponseSource, WeibullObserver};
use staircase::session::report::SessionRecord;
use staircase::session::response::{Classified, KeyMap};
use staircase::session::runner::run_titration;

/// Reads detection judgments from the terminal, one line per trial.
///
/// The chamber key map decides which keys count and what they mean;
/// anything else re-prompts. Response time is measured from the prompt
/// to the accepted line.
struct StdinObserver {
    keys: KeyMap,
}

impl StdinObserver {
    fn new(keys: KeyMap) -> Self {
        Self { keys }
    }
}

impl ResponseSource for StdinObserver {
    fn respond(&mut self, intensity: f64) -> Observation {
        prompt_response(&mut io::stdin().lock(), &self.keys, intensity)
    }
}

/// Prompt until a line classifies as an answer. End of input arrives as
/// `Ok(0)`, not `Err`; either way the stream is gone, the trial counts as
/// not detected, and the session can still finish and write its record.
fn prompt_response<R: BufRead>(input: &mut R, keys: &KeyMap, intensity: f64) -> Observation {
    let mut line = String::new();
    let started = Instant::now();
    loop {
        print!(
            "intensity {:.4}  [{}] yes  [{}] no: ",
            intensity, keys.yes_key, keys.no_key
        );
        let _ = io::stdout().flush();
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                warn!("stdin closed; treating trial as not detected");
                return Observation {
                    detected: false,
                    rt: started.elapsed().as_secs_f64(),
                };
            }
            Ok(_) => {}
        }
        match keys.classify(Some(line.trim())) {
            Classified::Answer(answer) => {
                return Observation {
                    detected: answer.detected(),
                    rt: started.elapsed().as_secs_f64(),
                };
            }
            Classified::NoResponse | Classified::Unknown => {
                println!("  press {} or {}", keys.yes_key, keys.no_key);
            }
        }
    }
}

/// Asks the experimenter whether the estimate looks stable enough to stop.
fn ask_sufficient() -> bool {
    print!("Titration sufficient? [y/N]: ");
    let _ = io::stdout().flush();
    sufficient_from(&mut io::stdin().lock())
}

/// A closed stream means nobody is left to ask for another pass; stop and
/// keep what the session has.
fn sufficient_from<R: BufRead>(input: &mut R) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => true,
        Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut cfg = AppConfig::load_or_default(&args.config);

    if let Some(trials) = args.trials {
        cfg.quest.n_trials = trials;
    }
    if let Some(seed) = args.seed {
        cfg.session.seed = Some(seed);
    }
    if let Some(dir) = &args.data_dir {
        cfg.output.data_dir = dir.clone();
    }

    let chamber = Chamber::from_number(args.chamber)
        .ok_or_else(|| format!("chamber must be 1 or 2, got {}", args.chamber))?;

    let seed = cfg.session.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    info!(pair_id = args.pair_id, %chamber, seed, "starting titration session");

    let quest_config = cfg.quest.to_quest_config();
    let mut keys = KeyMap::for_chamber(chamber, args.pair_id);
    keys.yes_means_detected = cfg.session.yes_means_detected;

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_for_ctrlc = stop_flag.clone();

    ctrlc::set_handler(move || {
        stop_flag_for_ctrlc.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let mut source: Box<dyn ResponseSource> = if args.auto {
        let rng = StdRng::seed_from_u64(seed);
        let observer = WeibullObserver::from_config(&quest_config, args.threshold, rng)
            .ok_or("simulated observer: threshold probability outside the attainable range")?;
        Box::new(observer)
    } else {
        Box::new(StdinObserver::new(keys))
    };

    let mut titration_counter: u32 = 0;
    let record = loop {
        titration_counter += 1;
        let mut estimator = ThresholdEstimator::new(quest_config.clone())?;
        let run = run_titration(
            &mut estimator,
            source.as_mut(),
            cfg.session.estimate,
            &stop_flag,
        );

        println!(
            "pass {}: mean {:.4}  sd {:.4}  median {:.4}  ({} trials{})",
            titration_counter,
            estimator.mean(),
            estimator.sd(),
            estimator.quantile(0.5),
            run.trials.len(),
            if run.interrupted { ", interrupted" } else { "" },
        );

        if run.interrupted || args.auto || ask_sufficient() {
            break SessionRecord::assemble(
                args.pair_id,
                chamber,
                titration_counter,
                &estimator,
                &run,
            );
        }
        info!(titration_counter, "restarting titration with a fresh prior");
    };

    let path = SessionRecord::default_path(Path::new(&cfg.output.data_dir), args.pair_id, chamber);
    record.write_json(&path)?;
    println!("session record written to {}", path.display());

    Ok(())
}
