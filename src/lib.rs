// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! livecanvas: checkpointed live diagram views.
//!
//! Agents edit a view with short scripts that restore a stored checkpoint, delete elements and
//! append new ones. The [`hub::LiveViewHub`] gates each edit, resolves it into a full element
//! list, stores that list as a new checkpoint and pushes it to every subscribed renderer.

pub mod chunk;
pub mod config;
pub mod error;
pub mod http;
pub mod hub;
pub mod mcp;
pub mod model;
pub mod resolve;
pub mod selection;
pub mod store;
