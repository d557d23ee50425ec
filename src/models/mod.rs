//! Domain models for SheetDesk.
//!
//! # Core Concepts
//!
//! ## Documentation
//!
//! - [`Category`] and [`SubCategory`]: the two-level catalog every sheet and
//!   document lives in.
//! - [`Sheet`]: a documentation page made of [`Header`]s and [`Section`]s, with
//!   [`Attachment`]s. Sheets move through the review workflow described by
//!   [`SheetStatus`] (see [`crate::workflow`]).
//! - [`Comment`]: reviewer feedback on a sheet; posting one requests correction.
//! - [`Document`]: an uploaded file listed in a sub-category.
//!
//! ## Administration
//!
//! - [`Booking`]: a reservation with a computed amount.
//! - [`Page`]: paginated list envelope used by the admin indexes.

mod booking;
mod catalog;
mod comment;
mod document;
mod pagination;
mod sheet;

pub use booking::*;
pub use catalog::*;
pub use comment::*;
pub use document::*;
pub use pagination::*;
pub use sheet::*;
