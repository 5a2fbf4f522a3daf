//! Business-rule use cases: the arithmetic and filtering behind the pages.

pub mod allocation;
pub mod profit_loss;
pub mod rules;
pub mod suggestion;
