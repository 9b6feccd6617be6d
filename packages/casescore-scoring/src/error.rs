pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Storage(#[from] casescore_storage::Error),
	#[error("Finding source error: {message}")]
	FindingSource { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage(casescore_storage::Error::Sqlx(err))
	}
}
