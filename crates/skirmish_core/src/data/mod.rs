//! Data structures for authored configuration.
//!
//! Pure data types deserialized from RON. File loading is handled by
//! `skirmish_headless`.

mod unit_data;

pub use unit_data::UnitDefinition;
