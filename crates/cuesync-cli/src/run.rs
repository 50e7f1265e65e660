use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use cuesync_core::commands::{CommandOutcome, ShiftCuesCommand, ShiftScope};
use cuesync_core::cues::{TrackDocument, TrackFormat};
use cuesync_core::fs::validate_track_input_path;
use cuesync_core::settings::{SettingsManager, SyncSettings};
use cuesync_core::validation::{check_track, CueViolation};
use cuesync_core::{EditingSession, SessionHandle};

use crate::cli::{
    CheckCmd, ConvertCmd, MatchCmd, OutputFormat, SettingsAction, SettingsCmd, SettingsSet,
    ShiftCmd, TrackInput,
};

fn resolve(path: &str, label: &str) -> Result<PathBuf> {
    validate_track_input_path(path, label).map_err(anyhow::Error::msg)
}

fn open_session(input: &TrackInput, settings: &SyncSettings) -> Result<EditingSession> {
    let target = resolve(&input.target, "target")?;
    let session = match &input.source {
        Some(source) => {
            let source = resolve(source, "source")?;
            EditingSession::open_translation(target.clone(), &source, settings)
        }
        None => EditingSession::open(target.clone(), settings),
    };
    session.with_context(|| format!("failed to open {}", target.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn short_text(text: &str) -> String {
    let flat = text.replace('\n', " / ");
    if flat.chars().count() > 40 {
        format!("{}…", flat.chars().take(39).collect::<String>())
    } else {
        flat
    }
}

// =============================================================================
// match
// =============================================================================

pub fn run_match(cmd: MatchCmd, settings: &SyncSettings) -> Result<()> {
    let mut session = open_session(&cmd.input, settings)?;
    if cmd.editing_index < session.store.len() {
        session.store.set_editing_index(cmd.editing_index)?;
    } else {
        tracing::warn!(
            editing_index = cmd.editing_index,
            cues = session.store.len(),
            "Editing index out of range, using 0"
        );
    }

    let matched = session.store.cue_lines();
    tracing::info!(
        rows = matched.rows.len(),
        editing_row = matched.editing_row_index,
        "matched cue lines"
    );

    if cmd.input.format == OutputFormat::Json {
        return print_json(&matched);
    }

    for (row, line) in matched.rows.iter().enumerate() {
        let marker = if row == matched.editing_row_index {
            '>'
        } else {
            ' '
        };
        println!("{marker} row {row}");
        for entry in &line.target_cues {
            println!(
                "    T{:<4} {:>9.3} {:>9.3}  {}",
                entry.index,
                entry.cue.start(),
                entry.cue.end(),
                short_text(&entry.cue.text)
            );
        }
        for entry in &line.source_cues {
            println!(
                "    S{:<4} {:>9.3} {:>9.3}  {}",
                entry.index,
                entry.cue.start(),
                entry.cue.end(),
                short_text(&entry.cue.text)
            );
        }
    }
    Ok(())
}

// =============================================================================
// check
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    cues: usize,
    corrupted: usize,
    violations: &'a [CueViolation],
}

pub fn run_check(cmd: CheckCmd, settings: &SyncSettings) -> Result<()> {
    let session = open_session(&cmd.input, settings)?;
    let store = &session.store;
    let violations = check_track(store.cues(), &store.validation_context());
    let report = CheckReport {
        cues: store.len(),
        corrupted: store.cues().iter().filter(|c| c.corrupted).count(),
        violations: &violations,
    };
    tracing::info!(
        cues = report.cues,
        corrupted = report.corrupted,
        violations = violations.len(),
        "checked track"
    );

    match cmd.input.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            for v in &violations {
                println!(
                    "#{:<4} {:>9.3} {:>9.3}  {:<20} {}",
                    v.index, v.location.start_sec, v.location.end_sec, v.tag, v.message
                );
            }
            println!(
                "{} cues, {} corrupted, {} violations",
                report.cues,
                report.corrupted,
                violations.len()
            );
        }
    }

    if cmd.strict && !violations.is_empty() {
        bail!("{} violations found", violations.len());
    }
    Ok(())
}

// =============================================================================
// shift
// =============================================================================

pub fn run_shift(cmd: ShiftCmd, settings: &SyncSettings) -> Result<()> {
    let input = resolve(&cmd.input, "input")?;
    let session = EditingSession::open(input.clone(), settings)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut handle = SessionHandle::new(session);

    let scope = match (cmd.before, cmd.after) {
        (Some(index), _) => ShiftScope::Before(index),
        (None, Some(index)) => ShiftScope::After(index),
        (None, None) => ShiftScope::All,
    };
    let result = handle
        .execute(Box::new(ShiftCuesCommand::new(cmd.by, scope)))
        .with_context(|| format!("shift by {}s ({scope:?}) was rejected", cmd.by))?;

    if result.outcome != CommandOutcome::Applied {
        tracing::info!("nothing to shift");
        return Ok(());
    }

    match cmd.output {
        Some(output) => handle.save_as(output.clone()).with_context(|| {
            format!("failed to write {}", output.display())
        })?,
        None => handle
            .save()
            .with_context(|| format!("failed to write {}", input.display()))?,
    }
    tracing::info!(
        path = %handle.session().path.display(),
        delta_sec = cmd.by,
        "shifted cues"
    );
    Ok(())
}

// =============================================================================
// convert
// =============================================================================

pub fn run_convert(cmd: ConvertCmd) -> Result<()> {
    let input = resolve(&cmd.input, "input")?;
    if TrackFormat::from_path(&cmd.output).is_none() {
        bail!(
            "unsupported output extension: {} (expected .srt, .vtt or .json)",
            cmd.output.display()
        );
    }
    if cmd.output.exists() && !cmd.overwrite {
        bail!(
            "output exists: {} (pass --overwrite to replace it)",
            cmd.output.display()
        );
    }

    let document = TrackDocument::load(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    document
        .save(&cmd.output)
        .with_context(|| format!("failed to write {}", cmd.output.display()))?;
    tracing::info!(
        input = %input.display(),
        output = %cmd.output.display(),
        cues = document.cues.len(),
        "converted track"
    );
    Ok(())
}

// =============================================================================
// settings
// =============================================================================

pub fn run_settings(cmd: SettingsCmd, config_dir: &Path) -> Result<()> {
    let manager = SettingsManager::new(config_dir.to_path_buf());
    match cmd.action {
        SettingsAction::Show => print_json(&manager.load()),
        SettingsAction::Reset => {
            let settings = manager.reset().map_err(anyhow::Error::msg)?;
            print_json(&settings)
        }
        SettingsAction::Set(update) => {
            let mut settings = manager.load();
            apply_settings_update(&mut settings, &update);
            let saved = manager
                .save(&settings)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("failed to save {}", manager.settings_path().display()))?;
            print_json(&saved)
        }
    }
}

pub fn apply_settings_update(settings: &mut SyncSettings, update: &SettingsSet) {
    if let Some(enabled) = update.spec_enabled {
        settings.spec.enabled = enabled;
    }
    if let Some(ms) = update.min_duration_ms {
        settings.spec.min_duration_ms = Some(ms);
    }
    if let Some(ms) = update.max_duration_ms {
        settings.spec.max_duration_ms = Some(ms);
    }
    if let Some(lines) = update.max_lines {
        settings.spec.max_lines_per_caption = Some(lines);
    }
    if let Some(chars) = update.max_chars_per_line {
        settings.spec.max_characters_per_line = Some(chars);
    }
    if let Some(overlap) = update.overlap {
        settings.track.overlap_enabled = overlap;
    }
    if let Some(ms) = update.default_step_ms {
        settings.editing.default_step_ms = ms;
    }
    if let Some(ms) = update.min_duration_floor_ms {
        settings.editing.min_duration_floor_ms = ms;
    }
    if let Some(max) = update.max_history {
        settings.editing.max_history = max;
    }
}
