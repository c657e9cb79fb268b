//! The SEQIJR compartmental disease model.

pub mod seqijr;

pub use seqijr::*;
