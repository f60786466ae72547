// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod canvas;
pub mod role;
pub mod saved_objects;
pub mod usage;
pub mod version;
