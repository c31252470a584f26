use std::process::exit;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use log::{error, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use ordered_containers::{ContainerConfig, ContainerKind, OrderedContainer, Result};

const RANGE_QUERIES: usize = 100;
const RANGE_WIDTH: usize = 50;

#[derive(Parser, Debug)]
#[command(
    name = "ordered_bench",
    version,
    about = "Times every ordered container on one workload"
)]
struct Opt {
    /// Container to run; repeat for several. Runs all when omitted.
    #[arg(long = "kind", value_name = "KIND")]
    kinds: Vec<ContainerKind>,
    /// Number of distinct keys to insert.
    #[arg(long, default_value_t = 10_000)]
    count: usize,
    /// Seed for key shuffling and range query placement.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Order in which keys are inserted.
    #[arg(long, value_enum, default_value_t = Pattern::Random)]
    pattern: Pattern,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Sequential,
    Reverse,
    Random,
}

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    let opt = Opt::parse();
    match run(&opt) {
        Ok(true) => {}
        Ok(false) => {
            error!("Verification failed");
            exit(1);
        }
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    }
}

fn generate_keys(count: usize, pattern: Pattern, rng: &mut StdRng) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..count as u64).collect();
    match pattern {
        Pattern::Sequential => {}
        Pattern::Reverse => keys.reverse(),
        Pattern::Random => keys.shuffle(rng),
    }
    keys
}

fn run(opt: &Opt) -> Result<bool> {
    let kinds = if opt.kinds.is_empty() {
        ContainerKind::ALL.to_vec()
    } else {
        opt.kinds.clone()
    };
    info!("{} keys, {:?} order, seed {}", opt.count, opt.pattern, opt.seed);

    let mut rng = StdRng::seed_from_u64(opt.seed);
    let keys = generate_keys(opt.count, opt.pattern, &mut rng);
    let starts: Vec<u64> = if opt.count == 0 {
        Vec::new()
    } else {
        (0..RANGE_QUERIES)
            .map(|_| rng.gen_range(0..opt.count as u64))
            .collect()
    };

    let config = ContainerConfig::default();
    let mut ok = true;
    for kind in kinds {
        let mut container = kind.build::<u64, u64>(&config)?;
        ok &= bench_one(container.as_mut(), &keys, &starts);
    }
    Ok(ok)
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Runs every phase on one container, returning false on any wrong answer.
fn bench_one(
    container: &mut dyn OrderedContainer<u64, u64>,
    keys: &[u64],
    starts: &[u64],
) -> bool {
    let name = container.name();
    let count = keys.len() as u64;

    let (created, elapsed) = timed(|| {
        keys.iter()
            .filter(|&&k| container.insert(k, k * 2))
            .count()
    });
    info!("{}: insert {} keys in {:?}", name, keys.len(), elapsed);
    if created != keys.len() || container.len() != keys.len() {
        error!("{}: {} new entries, len {}", name, created, container.len());
        return false;
    }

    let (found, elapsed) = timed(|| {
        keys.iter()
            .filter(|&&k| container.search(&k) == Some(&(k * 2)))
            .count()
    });
    info!("{}: search {} keys in {:?}", name, keys.len(), elapsed);
    if found != keys.len() {
        error!("{}: found {} of {} keys", name, found, keys.len());
        return false;
    }

    let (wrong, elapsed) = timed(|| {
        starts
            .iter()
            .map(|&lo| {
                let hi = lo + RANGE_WIDTH as u64 - 1;
                let got = container.range(&lo, &hi).len() as u64;
                // Keys are exactly 0..count.
                got == hi.min(count - 1) - lo + 1
            })
            .filter(|ok| !ok)
            .count()
    });
    info!("{}: {} range queries in {:?}", name, starts.len(), elapsed);
    if wrong != 0 {
        error!("{}: {} range queries returned the wrong count", name, wrong);
        return false;
    }

    let (removed, elapsed) = timed(|| {
        keys.iter()
            .filter(|&&k| container.delete(&k))
            .count()
    });
    info!("{}: delete {} keys in {:?}", name, keys.len(), elapsed);
    if removed != keys.len() || !container.is_empty() {
        error!("{}: removed {}, {} left", name, removed, container.len());
        return false;
    }
    true
}
