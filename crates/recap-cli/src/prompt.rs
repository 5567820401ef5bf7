//! Interactive option prompts and the exit prompt.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use recap_models::{ClipSelectionMethod, RecapOptions, SubtitleAlignment};

use crate::error::RecapResult;

/// Ask for the common options, prefilled with the current values.
pub fn prompt_options(mut options: RecapOptions) -> RecapResult<RecapOptions> {
    options.video_data_file = prompt_path("Spreadsheet", &options.video_data_file)?;
    options.video_directory = prompt_path("Video directory", &options.video_directory)?;
    options.output_file = prompt_path("Output file", &options.output_file)?;

    let methods: Vec<&str> = ClipSelectionMethod::ALL.iter().map(|m| m.as_str()).collect();
    let current = ClipSelectionMethod::ALL
        .iter()
        .position(|m| *m == options.clip_selection_method)
        .unwrap_or(0);
    let selected = Select::new()
        .with_prompt("Clip selection method")
        .items(&methods)
        .default(current)
        .interact()?;
    options.clip_selection_method = ClipSelectionMethod::ALL[selected];

    if options.clip_selection_method == ClipSelectionMethod::Auto {
        options.clip_length = Input::new()
            .with_prompt("Clip length (seconds)")
            .default(options.clip_length)
            .validate_with(|length: &u32| {
                if *length > 0 {
                    Ok(())
                } else {
                    Err("Clip length must be positive")
                }
            })
            .interact_text()?;
    }

    let alignments: Vec<&str> = SubtitleAlignment::ALL.iter().map(|a| a.as_str()).collect();
    let current = SubtitleAlignment::ALL
        .iter()
        .position(|a| *a == options.sub_alignment)
        .unwrap_or(0);
    let selected = Select::new()
        .with_prompt("Caption alignment")
        .items(&alignments)
        .default(current)
        .interact()?;
    options.sub_alignment = SubtitleAlignment::ALL[selected];

    options.include_intro = Confirm::new()
        .with_prompt("Use the first clip as an intro?")
        .default(options.include_intro)
        .interact()?;

    if options.include_intro {
        options.use_overlay_intro_image = Confirm::new()
            .with_prompt("Overlay an image on the intro?")
            .default(options.use_overlay_intro_image)
            .interact()?;
    }

    if options.use_overlay_intro_image {
        options.intro_image_file = prompt_path("Intro image", &options.intro_image_file)?;
        options.intro_image_duration = Input::new()
            .with_prompt("Intro image duration (seconds)")
            .default(options.intro_image_duration)
            .interact_text()?;
        options.make_intro_image_fullscreen = Confirm::new()
            .with_prompt("Make the intro image fullscreen?")
            .default(options.make_intro_image_fullscreen)
            .interact()?;
    }

    Ok(options)
}

fn prompt_path(prompt: &str, current: &std::path::Path) -> RecapResult<PathBuf> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(current.to_string_lossy().to_string())
        .interact_text()?;
    Ok(PathBuf::from(value))
}

/// Block until Enter when stdin is a terminal. EOF ends the wait.
pub fn wait_for_enter(message: &str) -> io::Result<()> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(());
    }

    print!("{} Press Enter to exit.", message);
    io::stdout().flush()?;

    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(())
}
