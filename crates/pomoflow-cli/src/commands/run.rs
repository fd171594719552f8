//! The foreground session loop.
//!
//! Owns a [`PomodoroClock`] for the lifetime of the process and acts as its
//! view layer: renders the active phase and remaining time once per second,
//! starts the next interval when the controller advances, and accepts
//! line-based control commands on stdin. The session ends when the
//! configured number of work cycles has completed, on `quit`, or on Ctrl-C.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use pomoflow_core::{Config, Event, IntervalTicker, Phase, PomodoroClock, TickSource};
use tokio::sync::mpsc;

use crate::view;

#[derive(Args)]
pub struct RunArgs {
    /// Number of work cycles for the session
    #[arg(long)]
    cycles: Option<u32>,
    /// Work interval length in minutes
    #[arg(long)]
    work: Option<u32>,
    /// Short break length in minutes
    #[arg(long)]
    short_break: Option<u32>,
    /// Long break length in minutes
    #[arg(long)]
    long_break: Option<u32>,
    /// Display remaining time as H:MM:SS instead of H:MM
    #[arg(long)]
    seconds: bool,
    /// Wait for Enter between phases instead of auto-starting
    #[arg(long)]
    manual: bool,
    /// Emit events as JSON lines instead of the live display
    #[arg(long)]
    json: bool,
}

#[derive(PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(args))
}

async fn session(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let cycles = args.cycles.unwrap_or(config.session.work_cycles);
    let work = args.work.unwrap_or(config.durations.work);
    let short_break = args.short_break.unwrap_or(config.durations.short_break);
    let long_break = args.long_break.unwrap_or(config.durations.long_break);
    let show_seconds = args.seconds || config.display.show_seconds;

    let ticker: Arc<dyn TickSource> = Arc::new(IntervalTicker::one_second());
    let clock = PomodoroClock::new(cycles, ticker);
    clock.edit_timer(Phase::Work, 0, i64::from(work))?;
    clock.edit_timer(Phase::ShortBreak, 0, i64::from(short_break))?;
    clock.edit_timer(Phase::LongBreak, 0, i64::from(long_break))?;

    if let Some(event) = clock.start_timer() {
        emit(args.json, &event)?;
    }
    if !args.json {
        println!("commands: start | pause | skip <timer> | edit <timer> <h> <m> | cycles <n> | reset | quit");
        announce(&clock, show_seconds);
    }

    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut previous_phase = clock.current_phase();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if let Some(event) = clock.pause_timer() {
                    emit(args.json, &event)?;
                }
                if !args.json {
                    println!();
                    print_summary("session interrupted", &clock, cycles, work);
                }
                return Ok(());
            }
            line = lines.recv(), if stdin_open => {
                match line {
                    Some(line) => {
                        if handle_command(&clock, &line, args.json)? == Flow::Quit {
                            if !args.json {
                                print_summary("session ended", &clock, cycles, work);
                            }
                            return Ok(());
                        }
                        // A skip or reset may have changed the phase; do not
                        // mistake it for a completed countdown.
                        previous_phase = clock.current_phase();
                    }
                    None => stdin_open = false,
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }

        let phase = clock.current_phase();
        if phase != previous_phase {
            emit(
                args.json,
                &Event::TimerCompleted {
                    phase: previous_phase,
                    at: Utc::now(),
                },
            )?;
            if !args.json {
                println!();
                println!(
                    "{} {} finished",
                    view::phase_icon(previous_phase),
                    previous_phase
                );
            }

            if clock.cycle_count() >= cycles && phase == Phase::Work {
                if args.json {
                    emit(true, &clock.snapshot())?;
                } else {
                    print_summary("session complete", &clock, cycles, work);
                }
                return Ok(());
            }

            if args.manual && stdin_open && !args.json {
                println!("press Enter to start {phase}");
                if lines.recv().await.is_none() {
                    stdin_open = false;
                }
            }
            if let Some(event) = clock.start_timer() {
                emit(args.json, &event)?;
            }
            if !args.json {
                announce(&clock, show_seconds);
            }
            previous_phase = phase;
        }

        if !args.json {
            render_status(&clock, cycles, show_seconds);
        }
    }
}

/// Reads stdin on a plain thread so the select loop never blocks on it.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn handle_command(
    clock: &PomodoroClock,
    line: &str,
    as_json: bool,
) -> Result<Flow, Box<dyn std::error::Error>> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(Flow::Continue);
    };
    match cmd {
        "start" | "s" => {
            if let Some(event) = clock.start_timer() {
                emit(as_json, &event)?;
            }
        }
        "pause" | "p" => {
            if let Some(event) = clock.pause_timer() {
                emit(as_json, &event)?;
            }
        }
        "skip" => {
            let name = parts.collect::<Vec<_>>().join(" ");
            match name.parse::<Phase>() {
                Ok(phase) => {
                    let event = clock.skip_timer(phase);
                    emit(as_json, &event)?;
                }
                Err(e) => eprintln!("error: {e}"),
            }
        }
        "edit" => match parse_edit(&mut parts) {
            Ok((phase, hours, minutes)) => match clock.edit_timer(phase, hours, minutes) {
                Ok(event) => emit(as_json, &event)?,
                Err(e) => eprintln!("error: {e}"),
            },
            Err(message) => eprintln!("error: {message}"),
        },
        "cycles" => match parts.next().map(str::parse::<u32>) {
            Some(Ok(n)) => {
                let event = clock.edit_work_cycles(n);
                emit(as_json, &event)?;
            }
            _ => eprintln!("usage: cycles <n>"),
        },
        "reset" => {
            let event = clock.reset_pomodoro(clock.work_cycle_target());
            emit(as_json, &event)?;
        }
        "quit" | "q" => return Ok(Flow::Quit),
        other => eprintln!("unknown command: {other}"),
    }
    Ok(Flow::Continue)
}

/// Parses `edit <timer> <hours> <minutes>`; the timer name may be the
/// hyphenated or the two-word spelling.
fn parse_edit<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
) -> Result<(Phase, i64, i64), String> {
    let words: Vec<&str> = parts.collect();
    if words.len() < 3 {
        return Err("usage: edit <timer> <hours> <minutes>".to_string());
    }
    let (name_words, numbers) = words.split_at(words.len() - 2);
    let phase = name_words
        .join(" ")
        .parse::<Phase>()
        .map_err(|e| e.to_string())?;
    let hours = numbers[0]
        .parse::<i64>()
        .map_err(|_| format!("cannot parse '{}' as hours", numbers[0]))?;
    let minutes = numbers[1]
        .parse::<i64>()
        .map_err(|_| format!("cannot parse '{}' as minutes", numbers[1]))?;
    Ok((phase, hours, minutes))
}

fn emit(as_json: bool, event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

fn announce(clock: &PomodoroClock, show_seconds: bool) {
    let phase = clock.current_phase();
    println!(
        "{} {} ({})",
        view::phase_icon(phase),
        phase,
        render_time(clock.current_time(), show_seconds)
    );
}

fn print_summary(label: &str, clock: &PomodoroClock, cycles: u32, work_minutes: u32) {
    println!(
        "{label}: {} of {} work cycles, {} focused minutes",
        clock.cycle_count(),
        cycles,
        u64::from(clock.cycle_count()) * u64::from(work_minutes)
    );
}

fn render_status(clock: &PomodoroClock, cycles: u32, show_seconds: bool) {
    print!(
        "\r{} {:<11} {}   cycles {}/{}   ",
        view::phase_icon(clock.current_phase()),
        clock.current_phase().to_string(),
        render_time(clock.current_time(), show_seconds),
        clock.cycle_count(),
        cycles
    );
    let _ = std::io::stdout().flush();
}

fn render_time(secs: u64, show_seconds: bool) -> String {
    if show_seconds {
        view::format_hms(secs)
    } else {
        view::format_hm(secs)
    }
}
