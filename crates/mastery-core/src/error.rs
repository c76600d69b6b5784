use crate::detect::DetectTypeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    DetectType(#[from] DetectTypeError),

    #[error(
        "Malformed YAML front-matter. If you were trying to use a YAML front-matter, please ensure that you've correctly opened and closed the YAML front-matter with un-indented `---` blocks"
    )]
    MalformedFrontMatter,

    #[error("Invalid YAML front-matter: {message}")]
    InvalidFrontMatterYaml { message: String },

    #[error("Invalid YAML config: {message}")]
    InvalidConfigYaml { message: String },

    #[error("Glossary already contains term: {term}")]
    DuplicateTerm { term: String },

    #[error("Glossary does not contain term: {term}")]
    UnknownTerm { term: String },

    #[error("Glossary terms must not be empty")]
    EmptyTerm,

    #[error("Invalid attachment URL: {url}")]
    InvalidAttachmentUrl { url: String },

    #[error("Export serialization failed: {0}")]
    ExportJson(#[from] serde_json::Error),
}
