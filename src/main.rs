//! Plays a sound payload through the default audio device, positioned in
//! the 32-point soundscape.
//!
//! Usage:
//!   voicebox <file.wav|file.voc> [--pitch N] [--angle N] [--distance N] [--reverb N]
//!
//! `--pitch` is in hundredths of a semitone, `--angle` a compass index
//! (0-31), `--distance` 0-255 (negative places the sound behind), and
//! `--reverb` a 0-255 environmental intensity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs, process, thread};

use tracing_subscriber::EnvFilter;
use vox_master::{PlayParams, VoiceManager};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).unwrap_or_else(|| {
        eprintln!(
            "Usage: voicebox <file.wav|file.voc> [--pitch N] [--angle N] [--distance N] [--reverb N]"
        );
        process::exit(1);
    });

    let pitch = flag_value(&args, "--pitch").unwrap_or(0);
    let angle = flag_value(&args, "--angle").unwrap_or(0);
    let distance = flag_value(&args, "--distance").unwrap_or(0);
    let reverb = flag_value(&args, "--reverb").unwrap_or(0).clamp(0, 255) as u8;

    let payload = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        process::exit(1);
    });

    let mut manager = VoiceManager::open(8).unwrap_or_else(|e| {
        eprintln!("Failed to open audio output: {}", e);
        process::exit(1);
    });

    let finished = Arc::new(AtomicBool::new(false));
    let done = Arc::clone(&finished);
    manager.register_completion_callback(move |token| {
        println!("voice {} finished", token);
        done.store(true, Ordering::Relaxed);
    });

    manager.set_reverb(reverb);

    let handle = manager
        .play(PlayParams {
            payload: &payload,
            pitch_offset: pitch,
            angle,
            distance,
            priority: 0,
            token: Some(1),
        })
        .unwrap_or_else(|e| {
            eprintln!("Failed to play {}: {}", path, e);
            process::exit(1);
        });

    println!(
        "playing {} on channel {} (pitch {:+}, angle {}, distance {}, reverb {})",
        path, handle, pitch, angle, distance, reverb
    );

    while !finished.load(Ordering::Relaxed) {
        manager.drain_completions();
        thread::sleep(Duration::from_millis(10));
    }

    // Let the reverb tail ring out before the stream drops.
    if reverb > 0 {
        thread::sleep(Duration::from_millis(750));
    }
}

fn flag_value(args: &[String], flag: &str) -> Option<i32> {
    let index = args.iter().position(|a| a == flag)?;
    match args.get(index + 1).and_then(|v| v.parse().ok()) {
        Some(value) => Some(value),
        None => {
            eprintln!("{} expects an integer value", flag);
            process::exit(1);
        }
    }
}
