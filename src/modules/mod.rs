//! Business modules.

pub mod declaration;
