// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod elasticsearch;
pub mod license;
pub mod saved_objects;
pub mod security;
pub mod usage;
