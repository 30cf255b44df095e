//! Naturalization of DICOM JSON datasets.
//!
//! The wire model keys attributes by coded tag (`"0020000D"`) and wraps
//! every value in a `Value` array. Naturalization rewrites a dataset into a
//! keyword-keyed [`NaturalDataset`](dwl_types::NaturalDataset) with
//! unwrapped values, which is what the cache and its consumers read.
//!
//! Both directions are pure functions: no I/O, no shared state beyond the
//! static tag dictionary.

pub mod dictionary;
pub mod natural;

pub use dictionary::{keyword_for, tag_for, vr_for, DictionaryEntry};
pub use natural::{denaturalize, naturalize, naturalize_all};
