// SPDX-License-Identifier: GPL-3.0-only

//! Host capabilities: frame sources and permissions

pub mod camera;
pub mod permission;
