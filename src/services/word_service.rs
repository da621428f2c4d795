use tracing::debug;

use crate::{
    dao::models::WordRecord,
    error::ServiceError,
    state::{SharedState, date_key::DateKey},
};

/// Word of the day for the current calendar day.
pub async fn today_word(state: &SharedState) -> Result<(DateKey, WordRecord), ServiceError> {
    let today = state.today();
    let record = word_for(state, today).await?;
    Ok((today, record))
}

/// Word for `date`, served from the daily cache or acquired once on a miss.
pub async fn word_for(state: &SharedState, date: DateKey) -> Result<WordRecord, ServiceError> {
    let record = state
        .daily_cache()
        .get_or_acquire(date, state.word_source())
        .await?;
    debug!(%date, word = %record.word, "serving word of the day");
    Ok(record)
}
