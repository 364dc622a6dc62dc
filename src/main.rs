use std::fs::File;
use std::io::BufWriter;
use std::process;

use critter::prelude::*;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.first().map(String::as_str) {
        Some("--help" | "-h" | "help") => {
            print_help();
            return Ok(());
        }
        Some(cmd @ ("run" | "scenario" | "counter")) => (cmd, &args[1..]),
        Some(s) if !s.starts_with("--") => {
            eprintln!("Unknown command: {s}");
            print_help();
            process::exit(2);
        }
        _ => ("run", &args[..]),
    };

    let opts = Options::parse(rest).unwrap_or_else(|e| {
        eprintln!("{e}");
        print_help();
        process::exit(2);
    });

    match command {
        "scenario" => run_scenario(&opts)?,
        "counter" => run_counter(&opts),
        _ => run_agent(&opts)?,
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Options {
    config: Option<String>,
    seconds: Option<f32>,
    trace: Option<String>,
    noise: Option<f32>,
    seed: Option<u64>,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut opts = Options::default();
        let mut it = args.iter();
        while let Some(flag) = it.next() {
            let mut value = || {
                it.next()
                    .cloned()
                    .ok_or_else(|| format!("{flag} needs a value"))
            };
            match flag.as_str() {
                "--config" => opts.config = Some(value()?),
                "--trace" => opts.trace = Some(value()?),
                "--seconds" => opts.seconds = Some(parse_num(flag, &value()?)?),
                "--noise" => opts.noise = Some(parse_num(flag, &value()?)?),
                "--seed" => opts.seed = Some(parse_num(flag, &value()?)?),
                other => return Err(format!("Unknown option: {other}")),
            }
        }
        Ok(opts)
    }
}

fn parse_num<T: std::str::FromStr>(flag: &str, s: &str) -> Result<T, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("{flag}: invalid number '{s}'"))
}

fn print_help() {
    println!("critter (colour-counting critter)");
    println!("usage:");
    println!("  critter [run] [--config sim.json] [--seconds N] [--trace out.jsonl]");
    println!("  critter scenario [--noise x] [--seed n]");
    println!("  critter counter [--seconds N]");
    println!("  critter --help");
    println!();
    println!("Set RUST_LOG=info to see increment pulses as they happen.");
}

fn print_counts(label: &str, counts: impl IntoIterator<Item = (Colour, f32, u32)>) {
    let line: Vec<String> = counts
        .into_iter()
        .map(|(c, v, n)| format!("{}={v:.2}({n})", c.name()))
        .collect();
    println!("{label} {}", line.join(" "));
}

fn critter_counts(critter: &Critter) -> Vec<(Colour, f32, u32)> {
    Colour::COUNTED
        .into_iter()
        .map(|c| (c, critter.count(c), critter.pulses(c)))
        .collect()
}

fn run_agent(opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = match &opts.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(s) = opts.seconds {
        cfg.duration_s = s;
    }

    let mut agent = Agent::new(&cfg)?;
    let mut probe = opts
        .trace
        .as_ref()
        .map(|_| Probe::new(cfg.probe, cfg.critter.dt));
    let steps = cfg.total_steps();
    info!(steps, seconds = cfg.duration_s, "running critter");

    for step in 1..=steps {
        agent.step();
        if let Some(p) = probe.as_mut() {
            p.record(&agent.critter);
        }
        if cfg.report_every > 0 && step % cfg.report_every == 0 {
            let (x, y) = agent.world.body.cell();
            print_counts(
                &format!("t={:6.3} cell=({x},{y})", agent.critter.time()),
                critter_counts(&agent.critter),
            );
        }
    }

    let snap = CritterAdapter::new(&agent.critter).snapshot();
    let visited: Vec<&str> = agent.visits().iter().map(|c| c.name()).collect();
    println!("visited: {}", visited.join(" -> "));
    print_counts("final", critter_counts(&agent.critter));
    println!(
        "diagnostics: steps={} ambiguous={} percepts={} blended={}",
        snap.diagnostics.steps,
        snap.diagnostics.ambiguous_cells,
        snap.diagnostics.ambiguous_percepts,
        snap.diagnostics.blended_selections
    );

    if let (Some(path), Some(p)) = (&opts.trace, &probe) {
        p.write_jsonl(BufWriter::new(File::create(path)?))?;
        println!("wrote {} samples to {path}", p.samples().len());
    }
    Ok(())
}

fn run_scenario(opts: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let seed = opts.seed.unwrap_or(1);
    let scenario = ColourScenario::red_white_green().with_noise(opts.noise.unwrap_or(0.0), seed);
    let mut critter = Critter::new(CritterConfig::default().with_seed(seed))?;

    let colours: Vec<&str> = scenario.segments.iter().map(|s| s.colour.name()).collect();
    println!("sequence: {}", colours.join(", "));

    let report = scenario.run(&mut critter);
    print_counts(
        "final",
        Colour::COUNTED
            .into_iter()
            .map(|c| (c, report.count(c), report.pulses(c))),
    );
    println!(
        "diagnostics: steps={} ambiguous={} percepts={} blended={}",
        report.diagnostics.steps,
        report.diagnostics.ambiguous_cells,
        report.diagnostics.ambiguous_percepts,
        report.diagnostics.blended_selections
    );
    Ok(())
}

fn run_counter(opts: &Options) {
    let seconds = opts.seconds.unwrap_or(10.0);
    let dt = 0.001;
    let cfg = CounterConfig {
        gain: 10.0,
        tau: 10.0,
        ceiling: Some(30.0),
        ..Default::default()
    };
    let mut counter = LeakyCounter::new(&cfg, dt);
    let steps = (seconds / dt).round() as u64;
    for n in 0..steps {
        let t = n as f32 * dt;
        let v = counter.step(switch_signal(t));
        if n % 500 == 0 {
            println!("t={t:6.2} switch={} counter={v:.3}", switch_signal(t));
        }
    }
    println!("final counter={:.3}", counter.value());
}
