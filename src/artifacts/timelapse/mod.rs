//! Constrained redistribution of commit dates
//!
//! - `domain`: calendar constraints (days, weekdays, hour windows, offset)
//! - `remapper`: contiguous virtual-second coordinate over the admitted windows
//! - `reorder`: uniform, order-preserving reassignment of commit dates

pub mod domain;
pub mod remapper;
pub mod reorder;
