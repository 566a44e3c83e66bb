use tracing::info;
use uuid::Uuid;

use crate::error::{Result, SpillError};
use crate::ports::Store;
use crate::validation::validate_scale;

/// Aggregate rating of a secret: the author's own spiciness counts as one
/// implicit vote alongside every ledger rating. Rounded to one decimal place.
pub fn aggregate(self_rating: u8, ratings: &[u8]) -> f64 {
    let sum: u32 = u32::from(self_rating) + ratings.iter().map(|&r| u32::from(r)).sum::<u32>();
    let votes = 1 + ratings.len();
    round_to_tenth(f64::from(sum) / votes as f64)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Records `rater_id`'s rating of a secret they unlocked and returns the new aggregate.
///
/// Re-rating overwrites the previous value; the aggregate is always rebuilt
/// from the full ledger.
pub fn rate<S: Store + ?Sized>(store: &S, secret_id: Uuid, rater_id: Uuid, rating: i64) -> Result<f64> {
    let rating = validate_scale(rating, "rating")?;

    let target = store
        .find_secret(secret_id)?
        .filter(|s| !s.secret.is_hidden)
        .ok_or(SpillError::NotFound("secret"))?;

    if target.secret.author_id == rater_id {
        return Err(SpillError::SelfRatingForbidden);
    }

    if !store.has_unlocked(rater_id, secret_id)? {
        return Err(SpillError::NotUnlocked);
    }

    let avg_rating = store
        .record_rating(secret_id, rater_id, rating)?
        .ok_or(SpillError::NotFound("secret"))?;

    info!(
        "Secret {} rated {} by {} (aggregate now {})",
        secret_id, rating, rater_id, avg_rating
    );
    Ok(avg_rating)
}
