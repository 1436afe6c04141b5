// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use beatline::config::{validate_settings, SettingsEvent, SettingsWatcher};
use beatline::position::{grid_span, max_measures, timeline_end};
use beatline::waveform::{chunk_count, DEFAULT_LOD_TARGETS};
use beatline::{LodSet, Position, SampleBuffer};

fn print_usage() {
    println!("Beatline - DAW timeline core");
    println!();
    println!("Usage: beatline [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --clock <FILE>      Show the clock and grid described by a settings file");
    println!("  --waveform <FILE>   Build waveform levels for a WAV file");
    println!("  --watch <FILE>      Watch a settings file and report reloads");
    println!("  --help              Show this help message");
}

fn show_clock(path: &str) -> Result<()> {
    let settings = validate_settings(path)?;
    let clock = settings.clock()?;
    let sig = clock.time_signature();

    println!("Tempo:          {} BPM", clock.tempo());
    println!("Time signature: {}", sig);
    println!("Beat width:     {:.2} px", clock.beat_width());
    println!("Measure width:  {:.2} px", clock.measure_width());
    println!("Max measures:   {}", max_measures(sig));
    println!(
        "Timeline end:   {} ({:.2} s)",
        timeline_end(sig),
        timeline_end(sig).to_seconds(&clock)
    );
    match grid_span(settings.grid, &clock) {
        Some(span) => println!(
            "Grid:           {:?} = {} ({:.2} px)",
            settings.grid,
            span,
            span.to_pixels(&clock)
        ),
        None => println!("Grid:           off"),
    }

    let second_measure = Position::new(2, 1, 0, sig)?;
    println!(
        "{} is at {:.2} px, {:.3} s",
        second_measure,
        second_measure.to_pixel_offset(&clock),
        second_measure.to_seconds(&clock)
    );
    Ok(())
}

fn show_waveform(path: &str) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read audio file: {}", path))?;
    let buffer = SampleBuffer::decode_wav(&bytes)?;
    println!(
        "{} channel(s), {} samples at {} Hz ({:.2} s)",
        buffer.channel_count(),
        buffer.len(),
        buffer.sample_rate,
        buffer.duration_seconds()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let start = Instant::now();
    let lods = runtime.block_on(LodSet::build_async(
        Arc::new(buffer),
        DEFAULT_LOD_TARGETS.to_vec(),
    ))?;
    println!("Built {} levels in {:?}", lods.levels.len(), start.elapsed());

    for level in &lods.levels {
        let peak = level.buckets.iter().map(|b| b.max).fold(f32::NEG_INFINITY, f32::max);
        println!(
            "  {:>6} buckets, {:>10.2} samples/bucket, peak {:.3}",
            level.buckets.len(),
            level.samples_per_bucket,
            peak
        );
    }

    let width_px = lods.sample_count as f64 / 64.0;
    println!(
        "At 64 samples/px: {:.0} px in {} chunk(s) of 4096 px",
        width_px,
        chunk_count(width_px, 4096.0)
    );
    Ok(())
}

fn watch_settings(path: &str) -> Result<()> {
    let watcher = SettingsWatcher::new(path, None)?;
    println!("Watching {:?} (press Ctrl+C to stop)...", watcher.watched_path());

    let start_time = Instant::now();
    let run_duration = Duration::from_secs(300);

    while start_time.elapsed() < run_duration {
        for event in watcher.recv_all() {
            match event {
                SettingsEvent::Reloaded(settings) => match settings.clock() {
                    Ok(clock) => println!(
                        "Reloaded: {} BPM, {}, grid {:?}",
                        clock.tempo(),
                        clock.time_signature(),
                        settings.grid
                    ),
                    Err(e) => println!("Reloaded with invalid clock: {:#}", e),
                },
                SettingsEvent::Error(message) => println!("Error: {}", message),
                SettingsEvent::FileCreated(path) => println!("Created: {:?}", path),
                SettingsEvent::FileDeleted(path) => println!("Deleted: {:?}", path),
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Beatline - DAW timeline core");
        println!("Run with --help for usage information");
        return Ok(());
    }

    let option = args[1].as_str();
    let file = args.get(2).map(String::as_str);

    match (option, file) {
        ("--clock", Some(path)) => show_clock(path)?,
        ("--waveform", Some(path)) => show_waveform(path)?,
        ("--watch", Some(path)) => watch_settings(path)?,
        ("--clock" | "--waveform" | "--watch", None) => {
            eprintln!("Error: {} requires a file path", option);
            std::process::exit(1);
        }
        ("--help" | "-h", _) => print_usage(),
        _ => {
            eprintln!("Unknown option: {}", option);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
