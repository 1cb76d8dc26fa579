//! AI Vision: upload an image, get a model-written description, keywords and
//! follow-up questions.

pub mod analysis;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod encoder;
pub mod gemini;
pub mod keywords;
pub mod language;
pub mod model;
pub mod normalize;
pub mod routes;
pub mod session;
