//! apivet Core Library
//!
//! This library checks OpenAPI and Swagger definitions submitted as raw text and
//! shapes the verdict for HTTP callers, the terminal and the editor page.

pub mod config;
pub mod error;
pub mod openapi;
pub mod render;
pub mod response;
pub mod server;
pub mod staging;
pub mod validate;

pub use crate::{
    config::{Config, StagingStrategy},
    error::{Error, Result},
    openapi::{ApiSummary, DocumentValidator, OpenApiContext, OpenApiValidator},
    render::{extract_location, render_text, ErrorLocation, ResultView},
    response::StructuredResponse,
    server::{router, serve, AppState, SubmitRequest},
    validate::{ValidationOutcome, Validator},
};
