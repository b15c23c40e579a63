// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Wire contract for the BillKhata HTTP API: request/response DTOs, the
//! error envelope, the error-code to status-code mapping, and query
//! parameter parsing.

pub mod dto;
pub mod error_mapping;
pub mod errors;
pub mod params;

pub use errors::{ApiError, ApiErrorCode};
