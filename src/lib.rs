//! skillgap - Measure how well a curriculum covers job-market skill demand
//!
//! Job postings are turned into categorized skill mentions by an LLM-backed
//! extractor. The engine then normalizes and ranks them, matches the ranked
//! inventory against a syllabus and reports missing and under-emphasized
//! skills along with proposed syllabus changes. Supports multiple LLM
//! providers (Anthropic, OpenAI, OpenAI-compatible/Ollama, Gemini).

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod llm;
pub mod model;
pub mod syllabus;
pub mod util;
