pub(crate) mod common;

mod attribute_filter;
mod basic;
mod configuration;
mod coverage;
mod discovery;
mod name_filter;
mod sequential;
