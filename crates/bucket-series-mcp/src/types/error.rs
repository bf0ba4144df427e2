//! Error types and JSON-RPC error codes for the MCP server.

use bucket_series::SeriesError;

use super::message::{JsonRpcError, JsonRpcErrorObject, RequestId, JSONRPC_VERSION};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// MCP-specific error codes.
pub mod mcp_error_codes {
    pub const TOOL_NOT_FOUND: i32 = -32803;
    /// Event store could not answer (I/O, corrupt file, backend failure).
    pub const STORE_ERROR: i32 = -32852;
}

/// All errors that can occur in the MCP server.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        use mcp_error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::InternalError(_) | McpError::Io(_) => INTERNAL_ERROR,
            McpError::ToolNotFound(_) => TOOL_NOT_FOUND,
            McpError::StoreError(_) => STORE_ERROR,
            McpError::Json(_) => PARSE_ERROR,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> JsonRpcError {
        JsonRpcError {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error: JsonRpcErrorObject {
                code: self.code(),
                message: self.to_string(),
                data: None,
            },
        }
    }
}

impl From<SeriesError> for McpError {
    fn from(e: SeriesError) -> Self {
        if e.is_client_error() {
            McpError::InvalidParams(e.to_string())
        } else {
            McpError::StoreError(e.to_string())
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_error_classes_map_to_codes() {
        let err: McpError = SeriesError::InvalidEnumValue("week".into()).into();
        assert_eq!(err.code(), error_codes::INVALID_PARAMS);

        let err: McpError = SeriesError::TypeMismatch("got array".into()).into();
        assert_eq!(err.code(), error_codes::INVALID_PARAMS);

        let err: McpError = SeriesError::Store("connection refused".into()).into();
        assert_eq!(err.code(), mcp_error_codes::STORE_ERROR);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_json_rpc_error_shape() {
        let err = McpError::ToolNotFound("nope".into());
        let rpc = err.to_json_rpc_error(RequestId::Number(3));
        assert_eq!(rpc.error.code, -32803);
        assert_eq!(rpc.id, RequestId::Number(3));
        assert_eq!(rpc.error.message, "Tool not found: nope");
    }
}
