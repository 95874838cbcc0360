pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	ReadConfig { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}.")]
	ParseConfig { path: std::path::PathBuf, source: toml::de::Error },
	#[error("Failed to read tenant file at {path:?}.")]
	ReadTenant { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse tenant file at {path:?}.")]
	ParseTenant { path: std::path::PathBuf, source: serde_json::Error },
	#[error("{message}")]
	Validation { message: String },
}
