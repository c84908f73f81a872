pub mod domain;
pub mod error;
pub mod validation;
pub mod view;
