//! Voices command handler.
//!
//! Lists the voices the active backend reports and marks the one the
//! preference heuristic would pick.

use anyhow::Result;
use lipsync_voice::choose_voice;

use crate::bootstrap::CliContext;
use crate::presentation::{print_separator, truncate_string};

/// Execute the voices command.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let voices = ctx.service.voices();

    if voices.is_empty() {
        println!(
            "The {} backend reported no voices; the platform default voice will be used.",
            ctx.backend
        );
        return Ok(());
    }

    let settings = &ctx.config.settings;
    let choice = choose_voice(
        &voices,
        settings.preferred_voice_markers.as_slice(),
        &settings.preferred_locale,
    );
    let chosen = choice.voice().map(|v| v.id.as_str());

    println!("Found {} voice(s) from the {} backend:\n", voices.len(), ctx.backend);
    println!("  {:<20} {:<32} {:<10} Default", "ID", "Name", "Locale");
    print_separator(72);

    for voice in &voices {
        let marker = if chosen == Some(voice.id.as_str()) { '*' } else { ' ' };
        println!(
            "{marker} {:<20} {:<32} {:<10} {}",
            truncate_string(&voice.id, 19),
            truncate_string(&voice.name, 31),
            truncate_string(&voice.locale, 9),
            if voice.is_default { "yes" } else { "" }
        );
    }

    println!();
    match choice.voice() {
        Some(voice) => println!("* will be used ({} match): {}", choice.reason(), voice.name),
        None => println!("No preferred voice matched; the platform default will be used."),
    }
    Ok(())
}
