//! Emotion vocabulary.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Coarse grouping used when presenting the emotion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EmotionGroup {
    #[strum(to_string = "긍정")]
    Positive,
    #[strum(to_string = "부정")]
    Negative,
    #[strum(to_string = "중립")]
    Neutral,
}

/// One selectable emotion tag.
///
/// Serialized with its Korean label, which is what the backend and the
/// stored diaries carry. `FromStr` accepts the label or the English name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Emotion {
    #[serde(rename = "기쁨")]
    #[strum(to_string = "기쁨", serialize = "joy")]
    Joy,
    #[serde(rename = "행복")]
    #[strum(to_string = "행복", serialize = "happiness")]
    Happiness,
    #[serde(rename = "설렘")]
    #[strum(to_string = "설렘", serialize = "excitement")]
    Excitement,
    #[serde(rename = "뿌듯함")]
    #[strum(to_string = "뿌듯함", serialize = "pride")]
    Pride,
    #[serde(rename = "만족")]
    #[strum(to_string = "만족", serialize = "satisfaction")]
    Satisfaction,
    #[serde(rename = "감사")]
    #[strum(to_string = "감사", serialize = "gratitude")]
    Gratitude,
    #[serde(rename = "희망")]
    #[strum(to_string = "희망", serialize = "hope")]
    Hope,
    #[serde(rename = "사랑")]
    #[strum(to_string = "사랑", serialize = "love")]
    Love,
    #[serde(rename = "자신감")]
    #[strum(to_string = "자신감", serialize = "confidence")]
    Confidence,
    #[serde(rename = "편안함")]
    #[strum(to_string = "편안함", serialize = "comfort")]
    Comfort,
    #[serde(rename = "슬픔")]
    #[strum(to_string = "슬픔", serialize = "sadness")]
    Sadness,
    #[serde(rename = "실망")]
    #[strum(to_string = "실망", serialize = "disappointment")]
    Disappointment,
    #[serde(rename = "좌절")]
    #[strum(to_string = "좌절", serialize = "frustration")]
    Frustration,
    #[serde(rename = "상처")]
    #[strum(to_string = "상처", serialize = "hurt")]
    Hurt,
    #[serde(rename = "후회")]
    #[strum(to_string = "후회", serialize = "regret")]
    Regret,
    #[serde(rename = "외로움")]
    #[strum(to_string = "외로움", serialize = "loneliness")]
    Loneliness,
    #[serde(rename = "무기력")]
    #[strum(to_string = "무기력", serialize = "helplessness")]
    Helplessness,
    #[serde(rename = "분노")]
    #[strum(to_string = "분노", serialize = "anger")]
    Anger,
    #[serde(rename = "억울함")]
    #[strum(to_string = "억울함", serialize = "unfairness")]
    Unfairness,
    #[serde(rename = "미움")]
    #[strum(to_string = "미움", serialize = "resentment")]
    Resentment,
    #[serde(rename = "질투")]
    #[strum(to_string = "질투", serialize = "jealousy")]
    Jealousy,
    #[serde(rename = "두려움")]
    #[strum(to_string = "두려움", serialize = "fear")]
    Fear,
    #[serde(rename = "불안")]
    #[strum(to_string = "불안", serialize = "anxiety")]
    Anxiety,
    #[serde(rename = "당황")]
    #[strum(to_string = "당황", serialize = "embarrassment")]
    Embarrassment,
    #[serde(rename = "죄책감")]
    #[strum(to_string = "죄책감", serialize = "guilt")]
    Guilt,
    #[serde(rename = "수치심")]
    #[strum(to_string = "수치심", serialize = "shame")]
    Shame,
    #[serde(rename = "놀람")]
    #[strum(to_string = "놀람", serialize = "surprise")]
    Surprise,
    #[serde(rename = "궁금함")]
    #[strum(to_string = "궁금함", serialize = "curiosity")]
    Curiosity,
}

impl Emotion {
    /// All tags in presentation order.
    pub fn all() -> Vec<Emotion> {
        Emotion::iter().collect()
    }

    pub fn group(self) -> EmotionGroup {
        use Emotion::*;
        match self {
            Joy | Happiness | Excitement | Pride | Satisfaction | Gratitude | Hope | Love
            | Confidence | Comfort => EmotionGroup::Positive,
            Surprise | Curiosity => EmotionGroup::Neutral,
            _ => EmotionGroup::Negative,
        }
    }
}
