//! Device-apply payload handed to the sensation collaborator.
//!
//! Intensity and duration are clamped on construction, so every consumer of
//! this type sees values inside the ranges the peripheral accepts.
//!
//! Nothing in this workspace builds one yet; the type fixes the payload
//! contract for the component that will apply sensations to devices.

use crate::{ErrorLocation, SensationError};

use std::panic::Location;

use serde::Serialize;

/// Lowest accepted intensity (percent).
pub const MIN_INTENSITY: u8 = 0;

/// Highest accepted intensity (percent).
pub const MAX_INTENSITY: u8 = 100;

/// Shortest accepted duration in milliseconds.
pub const MIN_DURATION_MS: u32 = 50;

/// Longest accepted duration in milliseconds.
pub const MAX_DURATION_MS: u32 = 5000;

/// `{sensationId, intensity, duration}` request for the device-apply call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensationRequest {
    sensation_id: String,
    intensity: u8,
    #[serde(rename = "duration")]
    duration_ms: u32,
}

impl SensationRequest {
    /// Build a request, clamping `intensity` to 0-100 and `duration_ms` to 50-5000.
    ///
    /// # Errors
    ///
    /// Returns [`SensationError::Validation`] if `sensation_id` is blank.
    #[track_caller]
    pub fn new(
        sensation_id: impl Into<String>,
        intensity: i64,
        duration_ms: i64,
    ) -> Result<Self, SensationError> {
        let sensation_id = sensation_id.into();
        if sensation_id.trim().is_empty() {
            return Err(SensationError::Validation {
                message: "sensation id cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let intensity = intensity.clamp(i64::from(MIN_INTENSITY), i64::from(MAX_INTENSITY)) as u8;
        let duration_ms =
            duration_ms.clamp(i64::from(MIN_DURATION_MS), i64::from(MAX_DURATION_MS)) as u32;

        Ok(Self {
            sensation_id,
            intensity,
            duration_ms,
        })
    }

    pub fn sensation_id(&self) -> &str {
        &self.sensation_id
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}
