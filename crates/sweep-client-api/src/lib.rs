// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client for the Sweep field-service API.
//!
//! Each replayable operation kind has one method; all of them share the
//! uniform success/failure contract the drain coordinator depends on. The
//! [`RemoteApi`] trait is the seam: production code wires in [`ApiClient`],
//! tests wire in counting stubs.

pub mod client;
pub mod error;
pub mod remote;

pub use client::{ApiClient, ApiResponse, TaskState};
pub use error::{ApiError, Result};
pub use remote::RemoteApi;
