use axum::response::IntoResponse;

// Undocumented banner route; health carries the real status.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, response::IntoResponse};

    #[tokio::test]
    async fn root_returns_banner() {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
