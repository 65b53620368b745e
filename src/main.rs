//! Hook Address Miner CLI
//!
//! Usage:
//!   hook_miner -f BEFORE_ADD_LIQUIDITY -b 0x                 # empty bytecode, one flag
//!   hook_miner -f before_swap,after_swap --bytecode-file Hook.bin \
//!       -a address:0x000000000004444c5dc75cB358380D2e3dE08A90 # with constructor args

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, warn};

use hook_miner::{Config, FlagMask, Miner, MinedSalt, SearchResult, WorkerPool};

fn main() {
    let config = Config::parse();
    config.log.init();

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let job = match config.mining_request().and_then(|r| r.prepare().map_err(Into::into)) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Input error: {}", e);
            process::exit(1);
        }
    };

    println!("Hook Address Miner");
    println!("==================");
    println!("Flags:          {}", config.flag_set().unwrap_or_default());
    println!("Mask / value:   0x{:04x} / 0x{:04x}", job.mask.mask, job.mask.value);
    println!("Factory:        {}", job.factory);
    println!("Init code hash: 0x{}", hex::encode(job.init_code_hash));
    println!("Expected tries: ~{}", format_count(job.mask.expected_attempts()));
    println!("Workers:        {}", config.worker_count());
    println!();

    let mut pool = Miner::new(job)
        .workers(config.worker_count())
        .check_interval(config.check_interval)
        .spawn(hook_miner::CancelToken::new());

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cancel = pool.cancel_token();
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::Relaxed);
            cancel.cancel();
        })
        .expect("set Ctrl-C handler");
    }

    println!("Searching... (Press Ctrl+C to stop)\n");

    let deadline = config.timeout().map(|t| Instant::now() + t);
    let result = loop {
        let wait = config.next_wait(deadline, pool.is_stopped(), Instant::now());
        if let Some(result) = pool.wait_for_result(wait) {
            break result;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) && !pool.is_stopped() {
            warn!("timeout reached, cancelling");
            pool.stop();
        }
        print_progress(&pool);
    };

    match result {
        SearchResult::Found(ref found) => print_result(found),
        SearchResult::Cancelled(_) if interrupted.load(Ordering::Relaxed) => {
            println!("\nStopped by user.")
        }
        SearchResult::Cancelled(_) => println!("\nTimed out without a match."),
    }

    let stats = result.stats();
    println!("\n--- Final Statistics ---");
    println!("Total salts tried: {}", format_count(stats.attempts));
    println!("Time elapsed:      {:.2}s", stats.elapsed.as_secs_f64());
    println!(
        "Average speed:     {}/s",
        format_count(stats.salts_per_second() as u64)
    );
    debug!(workers = stats.workers, "done");

    if !result.is_found() {
        process::exit(2);
    }
}

fn print_result(found: &MinedSalt) {
    println!("=== Match ===");
    println!("Address:      {}", found.address);
    println!("Salt:         0x{}", found.salt_hex());
    println!("Flags:        {}", found.flags());
    println!("Low bits:     0x{:04x}", FlagMask::flags_of(&found.address).bits());
    println!("Worker:       {}", found.worker_id);
}

fn print_progress(pool: &WorkerPool) {
    println!(
        "[{:>4}s] {} salts at {}/s, {:.2}x expected",
        pool.elapsed().as_secs(),
        format_count(pool.total_salts()),
        format_count(pool.salts_per_second() as u64),
        pool.luck()
    );
}

fn format_count(n: u64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];
    let x = n as f64;
    UNITS
        .iter()
        .find(|(scale, _)| x >= *scale)
        .map_or_else(|| n.to_string(), |(scale, unit)| format!("{:.2}{unit}", x / scale))
}
