//! School admissions: directory, the four-step application wizard and
//! completed application records.

pub mod code;
pub mod handlers;
pub mod models;
pub mod steps;
pub mod wizard;

pub use wizard::{AdmissionWizard, WizardStep};
