use axum::extract::FromRequest;

use crate::web::error::AppError;

/// `axum::Json` with rejections mapped onto `AppError`, so malformed or
/// incomplete bodies come back as 400 with the usual error envelope
/// instead of axum's default 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: serde::Serialize> axum::response::IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}
