use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid graph definition: {0}")]
    InvalidDefinition(String),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Invalid edge index")]
    InvalidEdgeIndex,
    #[error("Invalid point of interest index: {0}")]
    InvalidPoiIndex(usize),
    #[error("No path exists between the two points")]
    Unreachable,
    #[error("Route service error: {0}")]
    RouteService(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::RouteService(err.to_string())
    }
}
