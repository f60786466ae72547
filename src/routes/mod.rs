// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Route handlers for the HTTP API.

pub mod saved_objects;
pub mod security;

pub use saved_objects::saved_objects_router;
pub use security::security_router;
