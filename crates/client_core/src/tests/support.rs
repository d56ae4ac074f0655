use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::domain::{Event, EventId, Role, User, UserId};
use tokio::sync::Mutex;

use crate::{error::GatewayError, gateway::ApiGateway};

pub(crate) fn event(id: &str, title: &str, date: &str, price: f64, available_seats: u32) -> Event {
    Event {
        id: EventId::from(id),
        title: title.to_string(),
        description: String::new(),
        category: String::new(),
        location: String::new(),
        date: date.to_string(),
        time: String::new(),
        total_seats: 100,
        available_seats,
        price,
        image_url: None,
        created_at: None,
        updated_at: None,
    }
}

pub(crate) fn sample_events() -> Vec<Event> {
    vec![
        event("jazz", "Jazz Night", "2024-05-01", 20.0, 5),
        event("art", "Art Fair", "2024-05-02", 10.0, 50),
    ]
}

pub(crate) fn sample_user() -> User {
    User {
        id: UserId::from("u1"),
        name: "Ada".into(),
        email: "ada@example.com".into(),
        role: Role::User,
        created_at: None,
    }
}

pub(crate) fn auth_body(token: &str) -> Value {
    json!({ "user": sample_user(), "token": token })
}

pub(crate) fn offline() -> GatewayError {
    GatewayError::transport(
        "/events",
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    )
}

pub(crate) fn rejected(status: u16, message: &str) -> GatewayError {
    GatewayError::Status {
        path: "/".into(),
        status,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

/// Replies with queued responses in order and records every call.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<Value, GatewayError>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn reply(&self, reply: Result<Value, GatewayError>) {
        self.replies.lock().await.push_back(reply);
    }

    pub(crate) async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    async fn next(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.calls.lock().await.push(RecordedCall {
            method,
            path: path.to_string(),
            body,
            bearer: bearer.map(str::to_string),
        });
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(rejected(500, "no scripted reply")))
    }
}

#[async_trait]
impl ApiGateway for ScriptedGateway {
    async fn get(&self, path: &str, bearer: Option<&str>) -> Result<Value, GatewayError> {
        self.next("GET", path, None, bearer).await
    }

    async fn post(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.next("POST", path, Some(body), bearer).await
    }

    async fn put(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.next("PUT", path, Some(body), bearer).await
    }
}
