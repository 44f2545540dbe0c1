// ABOUTME: AI-assisted generation for reqtrack
// ABOUTME: Anthropic API client, prompt templates and the generation service

pub mod generation;
pub mod prompts;
pub mod service;

pub use generation::{
    AnthropicGenerator, DraftedChangeRequest, GeneratedIdea, GenerationError, GenerationResult,
    GenerationService, Generator, ProjectContext,
};
pub use service::{AIConfig, AIResponse, AIService, AIServiceError, AIServiceResult, Usage};
