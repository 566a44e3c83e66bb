use spill_types::models::{AnswerData, AnswerType};

use crate::error::{Result, SpillError};

/// Word cap for free-text ("secret") answers.
pub const MAX_SECRET_WORDS: usize = 100;

/// Character cap for the readable fallback of structured answers.
pub const MAX_QUICK_ANSWER_CHARS: usize = 500;

pub const MIN_SCALE: i64 = 1;
pub const MAX_SCALE: i64 = 5;

const SLIDER_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLimit {
    Words(usize),
    Chars(usize),
}

/// Text answers are the secret surface; structured answers belong to the
/// lightweight Q&A surface where `body` is only a fallback rendering.
pub fn body_limit(answer_type: AnswerType) -> BodyLimit {
    match answer_type {
        AnswerType::Text => BodyLimit::Words(MAX_SECRET_WORDS),
        AnswerType::Slider | AnswerType::MultipleChoice | AnswerType::ImageUpload => {
            BodyLimit::Chars(MAX_QUICK_ANSWER_CHARS)
        }
    }
}

pub fn word_count(body: &str) -> usize {
    body.split_whitespace().count()
}

pub fn validate_body(body: &str, answer_type: AnswerType) -> Result<()> {
    match body_limit(answer_type) {
        BodyLimit::Words(max) => {
            let words = word_count(body);
            if words == 0 || words > max {
                return Err(SpillError::InvalidAnswer(format!(
                    "answer must be between 1 and {max} words (got {words})"
                )));
            }
        }
        BodyLimit::Chars(max) => {
            let chars = body.trim().chars().count();
            if chars == 0 || chars > max {
                return Err(SpillError::InvalidAnswer(format!(
                    "answer must be between 1 and {max} characters (got {chars})"
                )));
            }
        }
    }
    Ok(())
}

/// Checks a 1..=5 scale value (spiciness, importance or a rating).
pub fn validate_scale(value: i64, field: &str) -> Result<u8> {
    if !(MIN_SCALE..=MAX_SCALE).contains(&value) {
        return Err(SpillError::InvalidRating(format!(
            "{field} must be between {MIN_SCALE} and {MAX_SCALE}"
        )));
    }
    u8::try_from(value).map_err(|_| SpillError::InvalidRating(format!("{field} is out of range")))
}

pub fn validate_answer_data(data: &AnswerData) -> Result<()> {
    match data {
        AnswerData::Text => Ok(()),
        AnswerData::Slider { value } => {
            if value.is_finite() && SLIDER_RANGE.contains(value) {
                Ok(())
            } else {
                Err(SpillError::InvalidAnswer(
                    "slider value must be between 0 and 100".into(),
                ))
            }
        }
        AnswerData::MultipleChoice { selected } => {
            if selected.is_empty() || selected.iter().any(|s| s.trim().is_empty()) {
                Err(SpillError::InvalidAnswer(
                    "select at least one non-empty option".into(),
                ))
            } else {
                Ok(())
            }
        }
        AnswerData::ImageUpload { image_url } => {
            if image_url.trim().is_empty() {
                Err(SpillError::InvalidAnswer("image answers need an image".into()))
            } else {
                Ok(())
            }
        }
    }
}
