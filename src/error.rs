use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the package store")]
    Database,
    #[display("could not open the image directory")]
    Storage,
    #[display("scan failed")]
    Scan,
    #[display("could not list packages")]
    List,
    #[display("could not delete package")]
    Delete,
    #[display("no package with id {_0}")]
    PackageNotFound(#[error(not(source))] String),
}
