// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::errors::JwtError;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86400;

/// How the `exp` claim is computed when a token is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expiration {
    /// Expire this many seconds after encoding
    Seconds(i64),
    /// Expire at this offset from the start of the current hour
    Hourly(i64),
    /// Expire at this offset from the start of the current day (UTC)
    Daily(i64),
}

impl Expiration {
    /// Concrete `exp` value for a token encoded at `now`.
    ///
    /// Offsets larger than the period roll into later periods; an offset that
    /// lands before `now` yields a token that is already expired. Fails with
    /// [`JwtError::InvalidClaims`] if the result does not fit in an `i64`.
    pub fn deadline(&self, now: i64) -> Result<i64, JwtError> {
        let deadline = match *self {
            Expiration::Seconds(ttl) => now.checked_add(ttl),
            Expiration::Hourly(offset) => {
                start_of_period(now, SECONDS_PER_HOUR).and_then(|start| start.checked_add(offset))
            }
            Expiration::Daily(offset) => {
                start_of_period(now, SECONDS_PER_DAY).and_then(|start| start.checked_add(offset))
            }
        };

        deadline.ok_or_else(|| JwtError::InvalidClaims("expiration out of range".to_string()))
    }
}

fn start_of_period(now: i64, period: i64) -> Option<i64> {
    now.checked_sub(now.rem_euclid(period))
}

/// Current wall clock time in seconds since UNIX epoch.
pub fn current_timestamp() -> Result<i64, JwtError> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(i64::try_from(elapsed.as_secs())?)
}
