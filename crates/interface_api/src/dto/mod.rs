//! Request and response bodies

pub mod invoice;
