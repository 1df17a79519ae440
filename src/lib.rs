//! FQT: Fabriq Quoting Toolkit
//!
//! A Unix-style toolkit for managing manufacturing quotations, cost
//! roll-ups and material price estimates as plain text files under git
//! version control.

pub mod cli;
pub mod core;
pub mod costing;
pub mod entities;
pub mod yaml;
