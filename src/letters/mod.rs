// Letter-rendering collaborator interface and HTTP client.

pub mod client;

pub use client::{
    HttpLetterClient, LetterError, LetterPackage, LetterRenderer, LetterRequest, LetterResult,
};
