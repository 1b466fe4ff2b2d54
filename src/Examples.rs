//! examples of usage of RustedNumMethods
/// one example per numerical method
pub mod numerical_examples;
