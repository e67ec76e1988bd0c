//! # Breathing Exercise
//!
//! 四个阶段循环：Inhale → Hold → Exhale → Rest → Inhale ...
//!
//! 状态机本身不读时钟，时间只通过 [`BreathingExercise::advance`] 推进，
//! 相同的时长序列总是得到相同的阶段变化。[`BreathingPacer`] 用单调时钟驱动它。

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::ExerciseError;

/// 呼吸阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
    Rest,
}

impl BreathPhase {
    /// 循环顺序
    pub const CYCLE: [BreathPhase; 4] = [
        BreathPhase::Inhale,
        BreathPhase::Hold,
        BreathPhase::Exhale,
        BreathPhase::Rest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Inhale",
            BreathPhase::Hold => "Hold",
            BreathPhase::Exhale => "Exhale",
            BreathPhase::Rest => "Rest",
        }
    }
}

impl fmt::Display for BreathPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 呼吸节律
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreathingPattern {
    /// 4-4-4-4
    #[default]
    Box,
    /// 4-4-4-2
    Relaxed,
}

impl BreathingPattern {
    pub fn name(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "Box Breathing",
            BreathingPattern::Relaxed => "Relaxed Breathing",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BreathingPattern::Box => "Nervous system regulation (4-4-4-4)",
            BreathingPattern::Relaxed => "A gentler rhythm with a short rest (4-4-4-2)",
        }
    }

    pub fn duration(&self, phase: BreathPhase) -> Duration {
        let secs = match (self, phase) {
            (BreathingPattern::Relaxed, BreathPhase::Rest) => 2,
            _ => 4,
        };
        Duration::from_secs(secs)
    }

    pub fn guidance(&self, phase: BreathPhase) -> &'static str {
        match (self, phase) {
            (BreathingPattern::Box, BreathPhase::Inhale) => "Fill your lungs with light...",
            (BreathingPattern::Box, BreathPhase::Hold) => "Hold the peace within...",
            (BreathingPattern::Box, BreathPhase::Exhale) => "Release the tension...",
            (BreathingPattern::Box, BreathPhase::Rest) => "Rest in the stillness...",
            (BreathingPattern::Relaxed, BreathPhase::Inhale) => "Inhale deeply...",
            (BreathingPattern::Relaxed, BreathPhase::Hold) => "Hold your breath...",
            (BreathingPattern::Relaxed, BreathPhase::Exhale) => "Exhale slowly...",
            (BreathingPattern::Relaxed, BreathPhase::Rest) => "Get ready...",
        }
    }

    /// 一个完整循环的时长
    pub fn cycle_duration(&self) -> Duration {
        BreathPhase::CYCLE.iter().map(|phase| self.duration(*phase)).sum()
    }
}

impl FromStr for BreathingPattern {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "box" | "4-4-4-4" => Ok(BreathingPattern::Box),
            "relaxed" | "4-4-4-2" => Ok(BreathingPattern::Relaxed),
            _ => Err(ExerciseError::UnknownPattern(s.to_string())),
        }
    }
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathingStatus {
    Idle,
    Running,
    Paused,
}

/// 一次阶段切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: BreathPhase,
    pub to: BreathPhase,
    /// 从最后一个阶段回到第一个阶段
    pub cycle_completed: bool,
}

/// 呼吸练习状态机
#[derive(Debug, Clone)]
pub struct BreathingExercise {
    pattern: BreathingPattern,
    status: BreathingStatus,
    phase_index: usize,
    elapsed: Duration,
    cycles: u32,
}

impl Default for BreathingExercise {
    fn default() -> Self {
        Self::new(BreathingPattern::default())
    }
}

impl BreathingExercise {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            pattern,
            status: BreathingStatus::Idle,
            phase_index: 0,
            elapsed: Duration::ZERO,
            cycles: 0,
        }
    }

    pub fn pattern(&self) -> BreathingPattern {
        self.pattern
    }

    pub fn status(&self) -> BreathingStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == BreathingStatus::Running
    }

    pub fn phase(&self) -> BreathPhase {
        BreathPhase::CYCLE[self.phase_index]
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles
    }

    pub fn elapsed_in_phase(&self) -> Duration {
        self.elapsed
    }

    pub fn remaining_in_phase(&self) -> Duration {
        self.pattern.duration(self.phase()).saturating_sub(self.elapsed)
    }

    /// 当前阶段进度，0.0 到 1.0
    pub fn progress(&self) -> f64 {
        self.elapsed.as_secs_f64() / self.pattern.duration(self.phase()).as_secs_f64()
    }

    /// 显示在呼吸球上的文字
    pub fn display_label(&self) -> &'static str {
        match self.status {
            BreathingStatus::Idle => "Begin",
            _ => self.phase().label(),
        }
    }

    pub fn guidance(&self) -> &'static str {
        match self.status {
            BreathingStatus::Idle => "Find your rhythm. Calm your mind.",
            _ => self.pattern.guidance(self.phase()),
        }
    }

    pub fn start(&mut self) {
        self.status = BreathingStatus::Running;
    }

    /// 暂停，保留当前阶段和进度
    pub fn pause(&mut self) {
        if self.status == BreathingStatus::Running {
            self.status = BreathingStatus::Paused;
        }
    }

    pub fn toggle(&mut self) {
        if self.is_running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// 停止并回到第一阶段
    pub fn stop(&mut self) {
        self.status = BreathingStatus::Idle;
        self.phase_index = 0;
        self.elapsed = Duration::ZERO;
        self.cycles = 0;
    }

    /// 推进时间，返回期间发生的阶段切换。未运行时不推进。
    pub fn advance(&mut self, elapsed: Duration) -> Vec<Transition> {
        let mut transitions = Vec::new();
        if !self.is_running() {
            return transitions;
        }

        self.elapsed += elapsed;
        loop {
            let duration = self.pattern.duration(self.phase());
            if self.elapsed < duration {
                break;
            }
            self.elapsed -= duration;

            let from = self.phase();
            self.phase_index = (self.phase_index + 1) % BreathPhase::CYCLE.len();
            let cycle_completed = self.phase_index == 0;
            if cycle_completed {
                self.cycles += 1;
            }
            transitions.push(Transition {
                from,
                to: self.phase(),
                cycle_completed,
            });
        }
        transitions
    }
}

/// 节拍器推送的事件
#[derive(Debug, Clone, PartialEq)]
pub enum PacerEvent {
    /// 进入新阶段
    Phase {
        phase: BreathPhase,
        guidance: &'static str,
        duration: Duration,
    },
    /// 每个节拍的阶段进度
    Tick { phase: BreathPhase, progress: f64 },
    CycleCompleted(u32),
}

/// 以固定节拍驱动 [`BreathingExercise`]
#[derive(Debug, Clone, Copy)]
pub struct BreathingPacer {
    tick: Duration,
}

impl Default for BreathingPacer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK)
    }
}

impl BreathingPacer {
    pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

    /// 零节拍会让 `interval` panic，退回默认节拍
    pub fn new(tick: Duration) -> Self {
        if tick.is_zero() {
            warn!("Zero pacer tick requested, using {:?}", Self::DEFAULT_TICK);
            return Self::default();
        }
        Self { tick }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// 运行 `cycles` 个完整循环，返回完成的循环数。
    /// 接收端关闭时提前结束。
    pub async fn run(
        &self,
        exercise: &mut BreathingExercise,
        cycles: u32,
        events: mpsc::UnboundedSender<PacerEvent>,
    ) -> u32 {
        let started = exercise.cycles_completed();
        let target = started + cycles;
        exercise.start();

        if !send_phase(&events, exercise.pattern(), exercise.phase()) {
            return 0;
        }

        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一个 tick 立即返回
        ticker.tick().await;
        let mut last = Instant::now();

        while exercise.cycles_completed() < target {
            ticker.tick().await;
            let now = Instant::now();
            let transitions = exercise.advance(now - last);
            last = now;

            for transition in transitions {
                if transition.cycle_completed {
                    let completed = exercise.cycles_completed();
                    debug!(completed, "Breathing cycle completed");
                    if events.send(PacerEvent::CycleCompleted(completed)).is_err() {
                        return completed - started;
                    }
                    if completed >= target {
                        break;
                    }
                }
                if !send_phase(&events, exercise.pattern(), transition.to) {
                    return exercise.cycles_completed() - started;
                }
            }

            if exercise.cycles_completed() < target {
                let tick = PacerEvent::Tick {
                    phase: exercise.phase(),
                    progress: exercise.progress(),
                };
                if events.send(tick).is_err() {
                    break;
                }
            }
        }

        exercise.pause();
        exercise.cycles_completed() - started
    }
}

fn send_phase(
    events: &mpsc::UnboundedSender<PacerEvent>,
    pattern: BreathingPattern,
    phase: BreathPhase,
) -> bool {
    events
        .send(PacerEvent::Phase {
            phase,
            guidance: pattern.guidance(phase),
            duration: pattern.duration(phase),
        })
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_zero_tick_uses_default() {
        assert_eq!(BreathingPacer::new(Duration::ZERO).tick(), BreathingPacer::DEFAULT_TICK);
        assert_eq!(BreathingPacer::new(secs(1)).tick(), secs(1));
    }

    #[test]
    fn test_idle_exercise_does_not_advance() {
        let mut exercise = BreathingExercise::new(BreathingPattern::Box);
        assert!(exercise.advance(secs(10)).is_empty());
        assert_eq!(exercise.phase(), BreathPhase::Inhale);
        assert_eq!(exercise.display_label(), "Begin");
        assert_eq!(exercise.guidance(), "Find your rhythm. Calm your mind.");
    }

    #[test]
    fn test_box_transitions() {
        let mut exercise = BreathingExercise::new(BreathingPattern::Box);
        exercise.start();

        assert!(exercise.advance(Duration::from_millis(3900)).is_empty());
        let transitions = exercise.advance(Duration::from_millis(100));
        assert_eq!(
            transitions,
            vec![Transition {
                from: BreathPhase::Inhale,
                to: BreathPhase::Hold,
                cycle_completed: false
            }]
        );
        assert_eq!(exercise.elapsed_in_phase(), Duration::ZERO);
        assert_eq!(exercise.guidance(), "Hold the peace within...");
    }

    #[test]
    fn test_wraps_to_first_phase() {
        let mut exercise = BreathingExercise::new(BreathingPattern::Box);
        exercise.start();

        let transitions = exercise.advance(secs(17));
        assert_eq!(transitions.len(), 4);
        assert!(transitions[3].cycle_completed);
        assert_eq!(transitions[3].to, BreathPhase::Inhale);
        assert_eq!(exercise.cycles_completed(), 1);
        assert_eq!(exercise.elapsed_in_phase(), secs(1));
    }

    #[test]
    fn test_relaxed_rest_is_shorter() {
        let pattern = BreathingPattern::Relaxed;
        assert_eq!(pattern.duration(BreathPhase::Rest), secs(2));
        assert_eq!(pattern.cycle_duration(), secs(14));

        let mut exercise = BreathingExercise::new(pattern);
        exercise.start();
        exercise.advance(secs(12));
        assert_eq!(exercise.phase(), BreathPhase::Rest);
        assert_eq!(exercise.guidance(), "Get ready...");
        exercise.advance(secs(2));
        assert_eq!(exercise.phase(), BreathPhase::Inhale);
        assert_eq!(exercise.cycles_completed(), 1);
    }

    #[test]
    fn test_same_durations_same_result() {
        let steps = [700, 3300, 50, 5000, 1, 2949, 4000];
        let mut a = BreathingExercise::new(BreathingPattern::Box);
        let mut b = BreathingExercise::new(BreathingPattern::Box);
        a.start();
        b.start();

        for ms in steps {
            assert_eq!(
                a.advance(Duration::from_millis(ms)),
                b.advance(Duration::from_millis(ms))
            );
        }
        assert_eq!(a.phase(), b.phase());
        assert_eq!(a.elapsed_in_phase(), b.elapsed_in_phase());
    }

    #[test]
    fn test_pause_keeps_position_stop_resets() {
        let mut exercise = BreathingExercise::new(BreathingPattern::Box);
        exercise.toggle();
        exercise.advance(secs(6));
        exercise.toggle();

        assert_eq!(exercise.status(), BreathingStatus::Paused);
        assert!(exercise.advance(secs(30)).is_empty());
        assert_eq!(exercise.phase(), BreathPhase::Hold);
        assert_eq!(exercise.elapsed_in_phase(), secs(2));
        assert!((exercise.progress() - 0.5).abs() < f64::EPSILON);

        exercise.stop();
        assert_eq!(exercise.status(), BreathingStatus::Idle);
        assert_eq!(exercise.phase(), BreathPhase::Inhale);
        assert_eq!(exercise.elapsed_in_phase(), Duration::ZERO);
    }

    #[test]
    fn test_pattern_parsing() {
        assert_eq!("Box".parse::<BreathingPattern>().unwrap(), BreathingPattern::Box);
        assert_eq!("4-4-4-2".parse::<BreathingPattern>().unwrap(), BreathingPattern::Relaxed);
        assert!("square".parse::<BreathingPattern>().is_err());
    }
}
