// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! File-backed wiki platform.
//!
//! Stores wikis and installed extensions as JSON under a data directory and
//! implements the provisioning collaborator traits on top of it.

pub mod error;
pub mod platform;
pub mod store;

pub use error::{PlatformError, Result};
pub use platform::{LocalPlatform, LOCK_FILE};
pub use store::WikiStore;
