//! Report item grouping, hierarchy labels, text export and week windowing.
//!
//! Everything in this crate is a pure function of its inputs. Missing or
//! inconsistent reference data never produces an error here: it degrades to
//! "Unknown" identities and `is_deleted` markers instead.

pub mod calendar;
pub mod draft;
pub mod error;
pub mod export;
pub mod grouping;
pub mod hierarchy;
pub mod model;
pub mod snapshot;

pub use error::{CoreError, Result};
pub use model::{Project, ReportItem, WorkBreakdownItem};
