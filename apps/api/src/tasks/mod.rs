// Single-call text tasks: each endpoint validates its input, fills one
// prompt template and returns the model's reply verbatim.

pub mod handlers;
