//! reCAPTCHA v3 spam protection for form submissions.
//!
//! `widget` swaps legacy reCAPTCHA fields for the v3 widget at load time,
//! `gate` judges each submission, and `verifier` talks to Google.

mod gate;
mod verifier;
mod widget;

pub use gate::SpamGate;
pub use verifier::{RecaptchaVerifier, SiteVerifier};
pub use widget::{FormDefinition, FormWidget, LoadedForm};

#[cfg(test)]
pub(crate) use verifier::testing;
