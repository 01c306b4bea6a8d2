use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header::CONTENT_TYPE, request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{
    decode, encode, DecodingKey, EncodingKey, Header, Validation,
};
use roster_admin::{
    api::{
        self,
        user::{Id, Role},
    },
    backend, config,
    dashboard::Session,
    policy, Dashboard,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

const SECRET: &[u8] = b"roster-admin-test-secret";

pub const ALICE: &str = "alice@example.com";
pub const BOB: &str = "bob@example.com";
pub const CAROL: &str = "carol@example.com";
pub const DAVE: &str = "dave@example.com";
pub const ERIN: &str = "erin@example.com";

pub fn user(id: &str, name: &str, email: &str, role: Role) -> api::User {
    api::User {
        id: Id::from(id),
        name: name.to_string(),
        email: email.to_string(),
        role,
    }
}

/// Alice (admin), Bob (moderator), Carol (user), Dave (superAdmin) and Erin
/// (manager), in that order.
pub fn roster() -> Vec<api::User> {
    vec![
        user("1", "Alice", ALICE, Role::Admin),
        user("2", "Bob", BOB, Role::Moderator),
        user("3", "Carol", CAROL, Role::User),
        user("4", "Dave", DAVE, Role::SuperAdmin),
        user("5", "Erin", ERIN, Role::Manager),
    ]
}

pub fn token(email: &str) -> String {
    let exp = OffsetDateTime::now_utc() + Duration::hours(1);
    encode(
        &Header::default(),
        &Claims {
            email: email.to_string(),
            exp: exp.unix_timestamp(),
        },
        &EncodingKey::from_secret(SECRET),
    )
    .expect("failed to encode a token")
}

pub fn dashboard(base_url: &str, session: Session) -> Dashboard {
    Dashboard::new(
        backend::Client::new(config::Backend {
            base_url: base_url.to_string(),
        })
        .expect("invalid base URL"),
        config::Roster::default(),
        session,
    )
}

/// Address nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind a listener");
    let addr = listener.local_addr().expect("failed to get an address");
    drop(listener);
    format!("http://{addr}")
}

/// In-process stand-in for the authentication service, enforcing the same
/// role policy as the dashboard.
pub struct Backend {
    addr: SocketAddr,
    state: SharedState,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl Backend {
    pub async fn spawn(users: Vec<api::User>) -> Self {
        let state = Arc::new(BackendState {
            users: Mutex::new(users),
            requests: AtomicUsize::new(0),
            canned: Mutex::new(None),
        });

        let app = Router::new()
            .route(backend::USERS_PATH, get(list_users))
            .route(
                &format!("{}/:id", backend::USERS_PATH),
                delete(delete_user),
            )
            .route(backend::CHANGE_ROLE_PATH, put(change_role))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind a listener");
        let addr = listener.local_addr().expect("failed to get an address");
        let (shutdown, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stopped.await;
                })
                .await
                .expect("backend failed");
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown),
            server: Some(server),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Session of a stored user, with a freshly issued token.
    pub fn session(&self, email: &str) -> Session {
        let role = self
            .users()
            .into_iter()
            .find(|u| u.email == email)
            .map(|u| u.role)
            .expect("unknown user");
        Session::new(&token(email), role, email)
    }

    pub fn dashboard(&self, email: &str) -> Dashboard {
        dashboard(&self.url(), self.session(email))
    }

    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn users(&self) -> Vec<api::User> {
        self.state.users.lock().unwrap().clone()
    }

    /// Makes every following request fail with `status`.
    pub fn fail_with(&self, status: StatusCode, message: Option<&str>) {
        *self.state.canned.lock().unwrap() = Some(match message {
            Some(message) => Reply::new(status, message),
            None => Reply {
                status,
                body: None,
            },
        });
    }

    /// Answers every following request with `status` and the raw `body`,
    /// leaving the stored users untouched.
    pub fn reply_with(&self, status: StatusCode, body: &str) {
        *self.state.canned.lock().unwrap() = Some(Reply {
            status,
            body: Some(body.to_string()),
        });
    }

    pub fn recover(&self) {
        *self.state.canned.lock().unwrap() = None;
    }

    /// Closes the listener and every open connection.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(server) = self.server.take() {
            server.await.expect("backend task failed");
        }
    }
}

type SharedState = Arc<BackendState>;

struct BackendState {
    users: Mutex<Vec<api::User>>,
    requests: AtomicUsize,
    canned: Mutex<Option<Reply>>,
}

/// Response produced outside the handlers: errors and canned replies.
#[derive(Clone, Debug)]
struct Reply {
    status: StatusCode,
    body: Option<String>,
}

impl Reply {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            body: Some(json!({ "message": message.to_string() }).to_string()),
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Invalid token")
    }

    fn denied(denied: policy::Denied) -> Self {
        Self::new(StatusCode::FORBIDDEN, denied)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) => {
                (self.status, [(CONTENT_TYPE, "application/json")], body)
                    .into_response()
            }
            None => self.status.into_response(),
        }
    }
}

#[derive(Deserialize, Serialize)]
struct Claims {
    email: String,
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedState> for Claims {
    type Rejection = Reply;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        state.requests.fetch_add(1, Ordering::SeqCst);
        let canned = state.canned.lock().unwrap().clone();
        if let Some(canned) = canned {
            return Err(canned);
        }

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Reply::unauthorized())?;
        let token_data = decode::<Self>(
            bearer.token(),
            &DecodingKey::from_secret(SECRET),
            &Validation::default(),
        )
        .map_err(|_| Reply::unauthorized())?;

        Ok(token_data.claims)
    }
}

impl BackendState {
    fn actor_role(&self, claims: &Claims) -> Result<Role, Reply> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == claims.email)
            .map(|u| u.role)
            .ok_or_else(Reply::unauthorized)
    }
}

#[derive(Deserialize)]
struct Page {
    page: usize,
    limit: usize,
}

async fn list_users(
    State(state): State<SharedState>,
    claims: Claims,
    Query(Page { page, limit }): Query<Page>,
) -> Result<Json<api::user::List>, Reply> {
    if !state.actor_role(&claims)?.is_admin() {
        return Err(Reply::new(StatusCode::FORBIDDEN, "Access denied"));
    }

    let users = state
        .users
        .lock()
        .unwrap()
        .iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .cloned()
        .collect();
    Ok(Json(api::user::List { users: Some(users) }))
}

async fn change_role(
    State(state): State<SharedState>,
    claims: Claims,
    Json(input): Json<api::user::ChangeRole>,
) -> Result<Json<api::Message>, Reply> {
    let acting = state.actor_role(&claims)?;

    let mut users = state.users.lock().unwrap();
    let target = users
        .iter_mut()
        .find(|u| u.email == input.email)
        .ok_or_else(|| Reply::new(StatusCode::NOT_FOUND, "User not found"))?;

    let is_self = target.email == claims.email;
    policy::check_role_change(acting, target.role, is_self)
        .and_then(|()| {
            policy::check_role_option(acting, target.role, input.new_role)
        })
        .map_err(Reply::denied)?;

    target.role = input.new_role;
    Ok(Json(api::Message {
        message: Some(format!("Role updated to {}", input.new_role)),
    }))
}

async fn delete_user(
    State(state): State<SharedState>,
    claims: Claims,
    Path(id): Path<String>,
) -> Result<Json<api::Message>, Reply> {
    let acting = state.actor_role(&claims)?;

    let mut users = state.users.lock().unwrap();
    let target = users
        .iter()
        .position(|u| u.id.as_str() == id)
        .ok_or_else(|| Reply::new(StatusCode::NOT_FOUND, "User not found"))?;

    let is_self = users[target].email == claims.email;
    policy::check_delete(acting, users[target].role, is_self)
        .map_err(Reply::denied)?;

    users.remove(target);
    Ok(Json(api::Message {
        message: Some("User deleted successfully".to_string()),
    }))
}
