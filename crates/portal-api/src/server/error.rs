#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    fn contact_unavailable(refused: &ContactUnavailable) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            error: ApiError::new(
                ErrorCode::ContactUnavailable,
                refused.to_string(),
                Some(format!("contact={}", refused.key)),
            ),
        }
    }

    fn from_session(err: SessionError) -> Self {
        match err {
            SessionError::ContactUnavailable(refused) => Self::contact_unavailable(&refused),
            SessionError::NoActiveContact => Self {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new(
                    ErrorCode::NoActiveContact,
                    "select a contact before sending",
                    None,
                ),
            },
            SessionError::EmptyMessage => Self {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new(ErrorCode::EmptyMessage, "message text is empty", None),
            },
            SessionError::EmptyTranscript => Self {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new(
                    ErrorCode::EmptyTranscript,
                    "investigate before filing charges",
                    None,
                ),
            },
        }
    }

    fn from_gateway(err: &GatewayError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            error: ApiError::new(
                ErrorCode::GatewayError,
                err.user_message(),
                Some(err.to_string()),
            ),
        }
    }

    fn from_portal(err: PortalError) -> Self {
        match err {
            PortalError::Session(session_err) => Self::from_session(session_err),
            PortalError::Gateway(gateway_err) => Self::from_gateway(&gateway_err),
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
