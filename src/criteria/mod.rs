//! Smart-group and advanced-search criteria.
//!
//! A [`Criteria`] list holds [`Criterion`] rules in priority order. A
//! criterion's identity is its `(and_or, name, search_type, value)`
//! signature, and a list never holds two criteria with the same signature.
//!
//! ```rust
//! use mdm_objects::criteria::{AndOr, Criteria, Criterion, SearchType};
//!
//! # fn main() -> Result<(), mdm_objects::error::ModelError> {
//! let mut criteria = Criteria::new(vec![
//!     Criterion::new(AndOr::And, "Department", SearchType::Is, "IT")?,
//! ])?;
//! criteria.append(Criterion::new(AndOr::Or, "Last Check-in", SearchType::LessThanDaysAgo, "7")?)?;
//! assert_eq!(criteria.get(1).map(|c| c.priority()), Some(1));
//! assert!(criteria.needs_update());
//! # Ok(())
//! # }
//! ```

#[allow(clippy::module_inception)]
pub mod criteria;
pub mod criterion;

pub use criteria::Criteria;
pub use criterion::{AndOr, Criterion, SearchType};
