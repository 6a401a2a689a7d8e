use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    status_code: u16,
    message: &'static str,
}

/// Fixed liveness response; never contacts the upstream repository.
pub async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status_code: 200,
        message: "API is running",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_matches_contract() {
        let json = serde_json::to_value(StatusResponse {
            status_code: 200,
            message: "API is running",
        })
        .unwrap();

        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["message"], "API is running");
    }
}
