// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration shared by the hub and its transports.

pub const DEFAULT_HTTP_PORT: u16 = 27436;
pub const DEFAULT_MAX_CHUNK_BYTES: u64 = 8 * 1024 * 1024;
pub const DEFAULT_MAX_CHUNK_ELEMENTS: usize = 20_000;

/// Ceilings for a single chunked upload. Exceeding either discards the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    pub max_bytes: u64,
    pub max_elements: usize,
}

impl Default for ChunkLimits {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_MAX_CHUNK_BYTES, max_elements: DEFAULT_MAX_CHUNK_ELEMENTS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Prefix for view URLs handed to renderers, e.g. `http://127.0.0.1:27436`.
    pub base_url: String,
    pub chunk_limits: ChunkLimits,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(DEFAULT_HTTP_PORT), chunk_limits: ChunkLimits::default() }
    }
}

impl HubConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_chunk_limits(mut self, chunk_limits: ChunkLimits) -> Self {
        self.chunk_limits = chunk_limits;
        self
    }
}

pub fn default_base_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}
