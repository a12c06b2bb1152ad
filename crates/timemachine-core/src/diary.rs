//! Diary list helpers: emotion filtering and recency ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::reflection::{Emotion, Reflection};

/// Emotion filter applied to the diary list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmotionFilter {
    #[default]
    All,
    Only(Emotion),
}

impl EmotionFilter {
    pub fn matches(&self, reflection: &Reflection) -> bool {
        match self {
            Self::All => true,
            Self::Only(emotion) => reflection.has_emotion(*emotion),
        }
    }
}

impl fmt::Display for EmotionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "전체"),
            Self::Only(emotion) => write!(f, "{}", emotion),
        }
    }
}

impl FromStr for EmotionFilter {
    type Err = strum::ParseError;

    /// `all`/`전체` or any emotion label (Korean or English).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s == "전체" {
            return Ok(Self::All);
        }
        Emotion::from_str(s).map(Self::Only)
    }
}

/// Reflections matching `filter`, in their original order.
pub fn filter_by_emotion(diary: &[Reflection], filter: EmotionFilter) -> Vec<Reflection> {
    diary
        .iter()
        .filter(|reflection| filter.matches(reflection))
        .cloned()
        .collect()
}

/// Newest first.
///
/// Entries whose id is not a timestamp sort after dated ones, by id.
pub fn sort_by_recency(diary: &mut [Reflection]) {
    diary.sort_by(|a, b| match (a.created_at(), b.created_at()) {
        (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    });
}
