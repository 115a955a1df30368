//! 2-tap IIR predictor state

use crate::{VAG_PREDICTOR_COUNT, VAG_PREDICTOR_TABLE, clamp_i16};

/// Rolling history of the two most recent output samples.
///
/// One instance lives for the duration of a single stream decode. It is
/// never shared between streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdpcmHistory {
    /// Previous sample
    pub h1: i32,
    /// Sample before the previous one
    pub h2: i32,
}

impl AdpcmHistory {
    pub const fn new() -> Self {
        Self { h1: 0, h2: 0 }
    }

    /// Prediction for the next sample, scaled by 64.
    #[inline]
    pub fn predict(&self, predictor: u8) -> i32 {
        let [c0, c1] = VAG_PREDICTOR_TABLE[predictor as usize % VAG_PREDICTOR_COUNT];
        self.h1 * c0 + self.h2 * c1
    }

    /// Combine a shifted residual with the prediction, clamp, and push the
    /// result into the history.
    ///
    /// Division truncates toward zero.
    #[inline]
    pub fn step(&mut self, residual: i32, predictor: u8) -> i16 {
        let sample = clamp_i16((residual * 64 + self.predict(predictor)) / 64);
        self.h2 = self.h1;
        self.h1 = sample;
        sample as i16
    }
}
