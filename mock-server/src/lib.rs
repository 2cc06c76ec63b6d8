use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::debug;

/// Token handed out for every successful login.
pub const LOGIN_TOKEN: &str = "QpwL5tke4Pnpja7X4";

pub const PER_PAGE: usize = 6;

pub const SUPPORT_URL: &str = "https://reqres.in/#support-heading";
pub const SUPPORT_TEXT: &str =
    "To keep ReqRes free, contributions towards server costs are appreciated!";

const USERS: [(u32, &str, &str); 12] = [
    (1, "George", "Bluth"),
    (2, "Janet", "Weaver"),
    (3, "Emma", "Wong"),
    (4, "Eve", "Holt"),
    (5, "Charles", "Morris"),
    (6, "Tracey", "Ramos"),
    (7, "Michael", "Lawson"),
    (8, "Lindsay", "Ferguson"),
    (9, "Tobias", "Funke"),
    (10, "Byron", "Fields"),
    (11, "George", "Edwards"),
    (12, "Rachel", "Howell"),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub id: u32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub url: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SingleUser {
    pub data: UserData,
    pub support: Support,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsersPage {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub data: Vec<UserData>,
    pub support: Support,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

/// Echo of a PUT, PATCH or DELETE on a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserChange {
    pub id: u32,
    pub method: String,
    pub received: serde_json::Value,
}

#[derive(Deserialize)]
pub struct PaddingQuery {
    pub size: usize,
}

/// A JSON document of arbitrary size.
#[derive(Debug, Serialize, Deserialize)]
pub struct Padding {
    pub size: usize,
    pub padding: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/users", get(list_users))
        .route(
            "/api/users/{id}",
            get(get_user)
                .put(change_user)
                .patch(change_user)
                .delete(change_user),
        )
        .route("/api/status", get(status))
        .route("/api/padding", get(padding))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn user(&(id, first, last): &(u32, &str, &str)) -> UserData {
    UserData {
        id,
        email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
    }
}

fn support() -> Support {
    Support {
        url: SUPPORT_URL.to_string(),
        text: SUPPORT_TEXT.to_string(),
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorBody>) {
    debug!(message, "rejecting login");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

async fn login(
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorBody>)> {
    let email = input
        .email
        .ok_or_else(|| bad_request("Missing email or username"))?;
    if input.password.is_none() {
        return Err(bad_request("Missing password"));
    }
    if !USERS.iter().any(|u| user(u).email == email) {
        return Err(bad_request("user not found"));
    }
    Ok(Json(LoginResponse {
        token: LOGIN_TOKEN.to_string(),
    }))
}

async fn get_user(Path(id): Path<u32>) -> Result<Json<SingleUser>, (StatusCode, Json<serde_json::Value>)> {
    USERS
        .iter()
        .find(|(user_id, _, _)| *user_id == id)
        .map(|u| {
            Json(SingleUser {
                data: user(u),
                support: support(),
            })
        })
        .ok_or((StatusCode::NOT_FOUND, Json(serde_json::json!({}))))
}

/// Echoes the JSON body of a change back, or answers 204 when there is none.
async fn change_user(method: Method, Path(id): Path<u32>, body: Bytes) -> Response {
    if !USERS.iter().any(|(user_id, _, _)| *user_id == id) {
        return (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response();
    }
    if body.is_empty() {
        debug!(%method, id, "change without a body");
        return StatusCode::NO_CONTENT.into_response();
    }
    match serde_json::from_slice(&body) {
        Ok(received) => Json(UserChange {
            id,
            method: method.to_string(),
            received,
        })
        .into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn list_users(Query(query): Query<PageQuery>) -> Json<UsersPage> {
    let page = query.page.unwrap_or(1).max(1);
    let data = USERS
        .iter()
        .skip(page.saturating_sub(1).saturating_mul(PER_PAGE))
        .take(PER_PAGE)
        .map(user)
        .collect();
    Json(UsersPage {
        page,
        per_page: PER_PAGE,
        total: USERS.len(),
        total_pages: USERS.len().div_ceil(PER_PAGE),
        data,
        support: support(),
    })
}

async fn status() -> &'static str {
    "ok"
}

async fn padding(Query(query): Query<PaddingQuery>) -> Json<Padding> {
    Json(Padding {
        size: query.size,
        padding: "x".repeat(query.size),
    })
}
