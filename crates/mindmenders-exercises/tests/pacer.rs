use std::time::Duration;

use mindmenders_exercises::{
    BreathPhase, BreathingExercise, BreathingPacer, BreathingPattern, BreathingStatus, PacerEvent,
};
use tokio::sync::mpsc;

fn phases(events: &[PacerEvent]) -> Vec<BreathPhase> {
    events
        .iter()
        .filter_map(|event| match event {
            PacerEvent::Phase { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_pacer_runs_one_box_cycle() {
    let mut exercise = BreathingExercise::new(BreathingPattern::Box);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let started = tokio::time::Instant::now();
    let completed = BreathingPacer::default().run(&mut exercise, 1, tx).await;

    assert_eq!(completed, 1);
    assert_eq!(started.elapsed(), Duration::from_secs(16));
    assert_eq!(exercise.status(), BreathingStatus::Paused);
    assert_eq!(exercise.phase(), BreathPhase::Inhale);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(
        phases(&events),
        vec![
            BreathPhase::Inhale,
            BreathPhase::Hold,
            BreathPhase::Exhale,
            BreathPhase::Rest
        ]
    );
    assert_eq!(events.last(), Some(&PacerEvent::CycleCompleted(1)));

    // 16s / 100ms 个节拍，完成循环的那一拍不再推送进度
    let ticks = events
        .iter()
        .filter(|event| matches!(event, PacerEvent::Tick { .. }))
        .count();
    assert_eq!(ticks, 159);
}

#[tokio::test(start_paused = true)]
async fn test_pacer_relaxed_two_cycles() {
    let mut exercise = BreathingExercise::new(BreathingPattern::Relaxed);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let started = tokio::time::Instant::now();
    let completed = BreathingPacer::new(Duration::from_millis(500))
        .run(&mut exercise, 2, tx)
        .await;

    assert_eq!(completed, 2);
    assert_eq!(started.elapsed(), Duration::from_secs(28));

    let mut cycles = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PacerEvent::CycleCompleted(n) = event {
            cycles.push(n);
        }
    }
    assert_eq!(cycles, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_pacer_stops_when_receiver_dropped() {
    let mut exercise = BreathingExercise::new(BreathingPattern::Box);
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let completed = BreathingPacer::default().run(&mut exercise, 3, tx).await;
    assert_eq!(completed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_pacer_zero_tick_still_completes() {
    let mut exercise = BreathingExercise::new(BreathingPattern::Box);
    let (tx, _rx) = mpsc::unbounded_channel();

    let started = tokio::time::Instant::now();
    let completed = BreathingPacer::new(Duration::ZERO).run(&mut exercise, 1, tx).await;

    assert_eq!(completed, 1);
    assert_eq!(started.elapsed(), Duration::from_secs(16));
}
