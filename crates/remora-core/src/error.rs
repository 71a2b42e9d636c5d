pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No diagram dialect detected for text: {text}")]
    UnknownDialect { text: String },

    #[error("Diagram parse error ({dialect}): {message}")]
    DialectParse { dialect: String, message: String },

    #[error("Empty diagram source")]
    EmptyInput,
}
