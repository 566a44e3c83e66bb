use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used in place of the author's real name on anonymous secrets.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Public face of an author as stored; anonymity is applied later by the projector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerType {
    Text,
    Slider,
    MultipleChoice,
    ImageUpload,
}

impl AnswerType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Slider => "slider",
            Self::MultipleChoice => "multipleChoice",
            Self::ImageUpload => "imageUpload",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "slider" => Some(Self::Slider),
            "multipleChoice" => Some(Self::MultipleChoice),
            "imageUpload" => Some(Self::ImageUpload),
            _ => None,
        }
    }
}

/// Structured payload of an answer. `body` always carries a readable fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AnswerData {
    Text,
    Slider { value: f64 },
    MultipleChoice { selected: Vec<String> },
    ImageUpload { image_url: String },
}

impl AnswerData {
    pub fn answer_type(&self) -> AnswerType {
        match self {
            Self::Text => AnswerType::Text,
            Self::Slider { .. } => AnswerType::Slider,
            Self::MultipleChoice { .. } => AnswerType::MultipleChoice,
            Self::ImageUpload { .. } => AnswerType::ImageUpload,
        }
    }
}

/// One answer ("secret") as held by the secret store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub id: Uuid,
    pub room_id: Uuid,
    pub author_id: Uuid,
    pub question_id: Uuid,
    pub body: String,
    pub self_rating: u8,
    pub importance: u8,
    pub avg_rating: Option<f64>,
    pub buyers_count: u32,
    pub is_anonymous: bool,
    pub is_hidden: bool,
    pub answer_data: AnswerData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Secret {
    pub fn answer_type(&self) -> AnswerType {
        self.answer_data.answer_type()
    }
}

/// A secret joined with its author's stored profile, as returned by listings.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoredSecret {
    pub secret: Secret,
    pub author: AuthorProfile,
}

/// A secret shaped for one particular viewer.
///
/// Locked secrets carry `None` for every withheld field rather than a
/// placeholder, so nothing about the hidden content is observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedSecret {
    pub id: Uuid,
    pub room_id: Uuid,
    pub question_id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub body: Option<String>,
    pub answer_type: AnswerType,
    pub answer_data: Option<AnswerData>,
    pub self_rating: u8,
    pub importance: Option<u8>,
    pub avg_rating: Option<f64>,
    pub buyers_count: u32,
    pub is_anonymous: bool,
    pub is_own_secret: bool,
    pub is_unlocked: bool,
    pub my_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}
