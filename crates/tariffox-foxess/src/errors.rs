// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of TariffOx.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use thiserror::Error;

/// FoxESS Open API error types
#[derive(Error, Debug)]
pub enum FoxError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("FoxESS API returned HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("FoxESS API errno {errno}: {message}")]
    ApiError { errno: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Signature or token rejected (errno {0})")]
    AuthenticationFailed(i64),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type FoxResult<T> = Result<T, FoxError>;
