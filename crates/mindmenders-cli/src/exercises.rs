use anyhow::anyhow;
use colored::Colorize;
use mindmenders_core::User;
use mindmenders_exercises::{
    BreathingExercise, BreathingPacer, BreathingPattern, GratitudeJournal, GroundingExercise,
    PacerEvent, SettingKey, Settings, GROUNDING_STEPS,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::{prompt, SettingsCommands};

const BAR_WIDTH: usize = 24;

fn progress_bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn render(event: PacerEvent) {
    match event {
        PacerEvent::Phase {
            phase,
            guidance,
            duration,
        } => {
            println!();
            println!(
                "{} {}  {}",
                format!("{:<7}", phase.label()).cyan().bold(),
                format!("{}s", duration.as_secs()).dimmed(),
                guidance.italic()
            );
        }
        PacerEvent::Tick { progress, .. } => {
            print!("\r  {}", progress_bar(progress).blue());
            let _ = io::stdout().flush();
        }
        PacerEvent::CycleCompleted(n) => {
            println!();
            println!("{}", format!("✨ Cycle {} complete", n).green());
        }
    }
}

pub async fn breathe(cycles: u32, pattern: &str) -> anyhow::Result<()> {
    let pattern: BreathingPattern = pattern.parse()?;
    let mut exercise = BreathingExercise::new(pattern);

    println!("{}", format!("🫁 {}", pattern.name()).cyan().bold());
    println!("{}", pattern.description().dimmed());
    println!("{}", exercise.guidance().dimmed());
    println!("{}", "Press Ctrl+C to stop".dimmed());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render(event);
        }
    });

    let pacer = BreathingPacer::default();
    let finished = tokio::select! {
        completed = pacer.run(&mut exercise, cycles, tx) => Some(completed),
        _ = tokio::signal::ctrl_c() => None,
    };
    // 发送端随 run 一起释放，打印任务会自然结束
    let _ = printer.await;

    println!();
    match finished {
        Some(completed) => println!(
            "{}",
            format!("🌿 {} cycles of calm. Well done.", completed).green()
        ),
        None => {
            println!(
                "{}",
                format!(
                    "Stopped during {} after {} cycles.",
                    exercise.phase(),
                    exercise.cycles_completed()
                )
                .yellow()
            );
            exercise.stop();
        }
    }
    Ok(())
}

pub fn ground(user: &User) -> anyhow::Result<()> {
    let mut exercise = GroundingExercise::new(user.id.clone());

    println!("{}", "🌍 5-4-3-2-1 Grounding".cyan().bold());
    println!("{}", "Notice what is around you, one sense at a time.".dimmed());

    while let Some(step) = exercise.current_step() {
        println!();
        println!(
            "{} {}",
            format!("Step {} of {}", exercise.step_number(), GROUNDING_STEPS.len()).dimmed(),
            format!("{} {}", step.count, step.prompt).cyan().bold()
        );
        for i in 1..=step.count {
            prompt(&format!("  {}.", i))?;
        }
        prompt(&format!("[Enter] {}", exercise.button_label()))?;
        exercise.next()?;
    }

    if let Some(session) = exercise.session() {
        println!();
        println!(
            "{}",
            format!(
                "🌿 Grounded at {}. You are here, and you are safe.",
                session.completed_at.format("%H:%M")
            )
            .green()
        );
    }
    Ok(())
}

pub fn gratitude(user: &User, items: Vec<String>) -> anyhow::Result<()> {
    let mut journal = GratitudeJournal::new(user.id.clone());
    for (index, item) in items.into_iter().enumerate() {
        journal.set_item(index, item)?;
    }

    let entry = journal.submit()?;
    println!("{}", "🙏 Today I'm grateful for:".cyan().bold());
    for item in &entry.items {
        println!("  • {}", item);
    }
    Ok(())
}

fn settings_path() -> anyhow::Result<PathBuf> {
    mindmenders_config::mindmenders_dir()
        .map(|dir| dir.join("settings.json"))
        .ok_or_else(|| anyhow!("Could not find home directory"))
}

pub fn load_settings() -> anyhow::Result<Settings> {
    Ok(Settings::load(&settings_path()?))
}

pub fn settings(command: Option<SettingsCommands>) -> anyhow::Result<()> {
    let path = settings_path()?;
    let mut settings = Settings::load(&path);

    match command.unwrap_or(SettingsCommands::Show) {
        SettingsCommands::Show => {
            println!("{}", "⚙️  Settings".cyan().bold());
            println!();
            for (key, enabled) in settings.entries() {
                let state = if enabled { "on".green() } else { "off".dimmed() };
                println!(
                    "{:<18} {:<4} {}",
                    key.label(),
                    state,
                    format!("{} ({})", key.description(), key).dimmed()
                );
            }
        }
        SettingsCommands::Toggle { key } => {
            let key: SettingKey = key.parse()?;
            let enabled = settings.toggle(key);
            settings.save(&path)?;
            let state = if enabled { "on" } else { "off" };
            println!("{}", format!("✅ {} is now {}", key.label(), state).green());
        }
    }
    Ok(())
}
