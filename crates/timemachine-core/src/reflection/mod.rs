//! Reflection domain module.
//!
//! # Module Structure
//!
//! - `emotion`: the fixed emotion vocabulary offered by the input wizard
//! - `model`: situations, reflections, conversation turns and reports

mod emotion;
mod model;

pub use emotion::{Emotion, EmotionGroup};
pub use model::{
    AI_ERROR_PREFIX, Message, Reflection, Report, Sender, Situation, format_korean_date,
    format_transcript,
};
