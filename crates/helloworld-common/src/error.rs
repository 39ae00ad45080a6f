use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("bad yaml".into());
        assert_eq!(e.to_string(), "configuration error: bad yaml");

        let e = Error::Migration("step v1 did not advance".into());
        assert_eq!(e.to_string(), "migration error: step v1 did not advance");

        let e = Error::NotFound("ui/missing.html".into());
        assert_eq!(e.to_string(), "not found: ui/missing.html");

        let e = Error::Other("misc".into());
        assert_eq!(e.to_string(), "misc");
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn open_missing() -> super::Result<()> {
            std::fs::read("/definitely/not/a/real/path")?;
            Ok(())
        }
        assert!(matches!(open_missing(), Err(Error::Io(_))));
    }
}
