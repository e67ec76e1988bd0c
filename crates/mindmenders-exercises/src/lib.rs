//! # MindMenders Exercises
//!
//! 练习页面的本地状态机，不依赖远端存储：
//!
//! - [`BreathingExercise`]: 四阶段呼吸节律，由 [`BreathingPacer`] 以 100ms 节拍驱动
//! - [`GroundingExercise`]: 5-4-3-2-1 五感着陆
//! - [`GratitudeJournal`]: 最多三条感恩记录
//! - [`Settings`]: 界面偏好开关

pub mod error;
pub mod breathing;
pub mod grounding;
pub mod gratitude;
pub mod settings;

pub use error::{ExerciseError, ExerciseResult};
pub use breathing::{
    BreathPhase, BreathingExercise, BreathingPacer, BreathingPattern, BreathingStatus,
    PacerEvent, Transition,
};
pub use grounding::{GroundingExercise, GroundingState, GroundingStep, GROUNDING_STEPS};
pub use gratitude::{GratitudeJournal, GratitudeState, GRATITUDE_SLOTS};
pub use settings::{SettingKey, Settings};
