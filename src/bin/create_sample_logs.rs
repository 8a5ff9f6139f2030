use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Creates a directory tree of synthetic Helgrind, DRD and ThreadSanitizer
/// logs (`<out>/<tool>/<tool>_<run>.log`) for benchmarks and manual runs.
/// Each run repeats the same handful of reports so deduplication has work.
fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <runs> <reports-per-run> <output-dir>", args[0]);
        std::process::exit(1);
    }

    let runs: usize = match args[1].parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Invalid number of runs: {}", args[1]);
            std::process::exit(1);
        }
    };
    let reports: usize = match args[2].parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Invalid number of reports: {}", args[2]);
            std::process::exit(1);
        }
    };
    let out_dir = Path::new(&args[3]);

    println!("Creating {} runs of {} reports per tool under {}", runs, reports, out_dir.display());
    for run in 0..runs {
        write_log(out_dir, "helgrind", run, reports, helgrind_report)?;
        write_log(out_dir, "drd", run, reports, drd_report)?;
        write_log(out_dir, "tsan", run, reports, tsan_report)?;
    }
    println!("Sample logs created successfully.");

    Ok(())
}

fn write_log(
    out_dir: &Path,
    tool: &str,
    run: usize,
    reports: usize,
    report: fn(usize, usize) -> String,
) -> io::Result<()> {
    let dir = out_dir.join(tool);
    fs::create_dir_all(&dir)?;

    let mut file = File::create(dir.join(format!("{}_{}.log", tool, run)))?;
    let pid = 1000 + run;
    writeln!(file, "=={}== {} thread error detector", pid, tool)?;
    writeln!(file, "=={}== Command: ./vehicle_sim", pid)?;
    writeln!(file, "=={}==", pid)?;

    for i in 0..reports {
        write!(file, "{}", report(pid, i))?;
    }

    Ok(())
}

// Component names and source files the synthetic frames point at
const SITES: [(&str, &str); 6] = [
    ("Buffer::push", "buffer.h"),
    ("Communicator::send", "communicator.h"),
    ("SocketEngine::run", "socketEngine.h"),
    ("Protocol::update", "protocol.h"),
    ("Observer::notify", "observer.h"),
    ("Debug::print", "debug.h"),
];

fn helgrind_report(pid: usize, i: usize) -> String {
    let (func, file) = SITES[i % SITES.len()];
    let body = match i % 3 {
        0 => format!("=={pid}== Possible data race during write of size 4 at 0x{:X} by thread #{}\n=={pid}== Locks held: none\n", 0x5000 + i, 2 + i % 4),
        1 => format!("=={pid}== Thread #{}: lock order \"0x{:X} before 0x{:X}\" violated\n=={pid}== Lock order violated\n", 2 + i % 4, 0x10 + i, 0x20 + i),
        _ => format!("=={pid}== Thread #{} unlocked a not-locked lock during read\n", 2 + i % 4),
    };
    format!(
        "=={pid}== ---Thread-Announcement------------------------------------------\n\
         =={pid}==\n\
         =={pid}== Thread #{} was created\n\
         =={pid}==    at 0x51A2: clone (clone.S:71)\n\
         =={pid}==\n\
         =={pid}== ----------------------------------------------------------------\n\
         {body}\
         =={pid}==    at 0x{:X}: {func}() ({file}:{})\n\
         =={pid}==    by 0x4E45: start_thread (pthread_create.c:463)\n\
         =={pid}==\n",
        2 + i % 4,
        0x6000 + i % SITES.len(),
        10 + 7 * (i % SITES.len()),
    )
}

fn drd_report(pid: usize, i: usize) -> String {
    let (func, file) = SITES[i % SITES.len()];
    let header = if i % 4 == 3 {
        "Mutex lock order violation: m1 before m2".to_string()
    } else {
        format!("Conflicting {} by thread {} at 0x{:X} size 4", if i % 2 == 0 { "store" } else { "load" }, 2 + i % 3, 0x7000 + i)
    };
    format!(
        "=={pid}== {header}\n\
         =={pid}==    at 0x{:X}: {func}() ({file}:{})\n\
         =={pid}==    by 0x4E45: start_thread (pthread_create.c:463)\n\
         =={pid}==\n",
        0x6100 + i % SITES.len(),
        12 + 5 * (i % SITES.len()),
    )
}

fn tsan_report(pid: usize, i: usize) -> String {
    let (func, file) = SITES[i % SITES.len()];
    let kind = match i % 4 {
        0 | 1 => "data race",
        2 => "lock-order-inversion (potential deadlock)",
        _ => "thread leak",
    };
    format!(
        "==================\n\
         WARNING: ThreadSanitizer: {kind} (pid={pid})\n\
         \x20 Write of size 4 at 0x{:X} by thread T{}:\n\
         \x20   #0 {func}() src/{file}:{} (vehicle_sim+0x{:X})\n\
         \x20   #1 worker(void*) src/main.cpp:44 (vehicle_sim+0x1A2B)\n\
         \n\
         SUMMARY: ThreadSanitizer: {kind} src/{file} in {func}\n\
         ==================\n",
        0x7B00 + i,
        1 + i % 3,
        20 + 3 * (i % SITES.len()),
        0x1000 + i % SITES.len(),
    )
}
