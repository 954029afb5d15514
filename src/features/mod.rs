//! Features layer - Business capabilities exposed over HTTP

pub mod members;
