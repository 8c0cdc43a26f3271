// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for wikiforge.

pub mod logging;
pub mod platform;
pub mod provisioning;

pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use platform::{PlatformConfig, PlatformConfigLayer};
pub use provisioning::{ProvisioningConfig, ProvisioningConfigLayer};
